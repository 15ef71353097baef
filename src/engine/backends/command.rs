//! External synthesizer program backend
//!
//! Runs a piper/kitten-style command line synthesizer once per request and
//! reads the WAV stream it writes to stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::audio::{decode_wav, AudioArtifact};
use crate::core::error::{Result, TtsError};
use crate::engine::config::CommandEngineConfig;
use crate::engine::traits::SynthesisBackend;

const VOICE_PLACEHOLDER: &str = "{voice}";
const TEXT_PLACEHOLDER: &str = "{text}";

/// Backend that shells out to a synthesizer executable
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandBackend {
    /// Resolve the configured program
    ///
    /// Fails with a config error when the program is neither an existing
    /// path nor found on `PATH`.
    pub fn resolve(config: &CommandEngineConfig) -> Result<Self> {
        let program = resolve_program(&config.program).ok_or_else(|| TtsError::Config {
            message: format!("synthesizer program '{}' not found", config.program),
            path: None,
        })?;

        Ok(Self {
            program,
            args: config.args.clone(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn render_args(&self, text: &str, voice_id: &str) -> (Vec<String>, bool) {
        let text_in_args = self.args.iter().any(|a| a.contains(TEXT_PLACEHOLDER));
        let args = self
            .args
            .iter()
            .map(|a| {
                a.replace(VOICE_PLACEHOLDER, voice_id)
                    .replace(TEXT_PLACEHOLDER, text)
            })
            .collect();
        (args, !text_in_args)
    }
}

impl SynthesisBackend for CommandBackend {
    fn name(&self) -> &str {
        "command"
    }

    fn synthesize(&self, text: &str, voice_id: &str) -> Result<AudioArtifact> {
        let (args, text_on_stdin) = self.render_args(text, voice_id);
        debug!("Running {:?} with {} args", self.program, args.len());

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(if text_on_stdin {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TtsError::Io {
                message: format!("failed to spawn synthesizer: {}", e),
                path: Some(self.program.clone()),
            })?;

        if text_on_stdin {
            if let Some(mut stdin) = child.stdin.take() {
                if let Err(e) = stdin.write_all(text.as_bytes()) {
                    drop(stdin);
                    // the child may already be gone; reap it either way
                    if let Err(kill_err) = child.kill() {
                        debug!("Synthesizer already exited: {}", kill_err);
                    }
                    let stderr = child
                        .wait_with_output()
                        .map(|out| String::from_utf8_lossy(&out.stderr).trim().to_string())
                        .unwrap_or_default();
                    return Err(TtsError::Io {
                        message: format!("failed to write text to synthesizer: {} {}", e, stderr)
                            .trim_end()
                            .to_string(),
                        path: Some(self.program.clone()),
                    });
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TtsError::Io {
                message: format!(
                    "synthesizer exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
                path: Some(self.program.clone()),
            });
        }

        decode_wav(&output.stdout)
    }
}

fn resolve_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    executable_in_path(program)
}

/// Find an executable by name on `PATH`
pub fn executable_in_path(command: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;

    #[cfg(windows)]
    let exts: Vec<String> = std::env::var_os("PATHEXT")
        .map(|v| {
            v.to_string_lossy()
                .split(';')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|| vec![".exe".to_string(), ".bat".to_string(), ".cmd".to_string()]);

    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(command);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            for ext in &exts {
                let with_ext = dir.join(format!("{command}{ext}"));
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
    }
    None
}
