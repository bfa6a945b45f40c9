pub mod server {
    pub const NAME: &str = "ssh-broker";
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PROTOCOL_VERSION: &str = "2025-06-18";
}

pub mod programs {
    pub const SSH: &str = "ssh";
    pub const RSYNC: &str = "rsync";
    pub const REMOTE_SHELL: &str = "bash";
    pub const RSYNC_ARCHIVE_FLAGS: &str = "-avz";
}

pub mod limits {
    pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;
    pub const COMMAND_SUBSTRING_LENGTH: usize = 50;
    pub const READ_CHUNK_BYTES: usize = 8192;
}

pub mod storage {
    pub const DATA_DIR_NAME: &str = ".ssh-broker";
    pub const DB_FILE_NAME: &str = "ssh.db";
    pub const BUSY_TIMEOUT_MS: u64 = 5_000;
}

pub mod redaction {
    pub const KEY_PATH_PLACEHOLDER: &str = "[REDACTED]";
}
