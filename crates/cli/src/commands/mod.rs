pub mod config;
pub mod doctor;
pub mod smoke;
pub mod stats;

/// Output plus the process exit code a command decided on. Commands render
/// their own payloads (human lines, or JSON where a flag asks for it).
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}
