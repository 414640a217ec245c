// Stable error codes, one per ErrorKind. These appear in HTTP responses
// and log lines, so existing values must never be renumbered.

pub mod records {
    pub const PATIENT_NOT_FOUND: &str = "RECORDS_1001";
    pub const BACKEND_FAILURE: &str = "RECORDS_1002";
}

pub mod tools {
    pub const UNKNOWN_OPERATION: &str = "TOOLS_2001";
    pub const INVALID_ARGUMENTS: &str = "TOOLS_2002";
}

pub mod upstream {
    pub const UPSTREAM_FAILURE: &str = "UPSTREAM_3001";
    pub const TIMEOUT: &str = "UPSTREAM_3002";
    pub const CANCELLED: &str = "UPSTREAM_3003";
}

pub mod system {
    pub const CONFIGURATION: &str = "SYSTEM_4001";
}
