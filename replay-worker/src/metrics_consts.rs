pub const RECORDS_RECEIVED: &str = "replay_records_received";
pub const RECORD_PARSE_ERRORS: &str = "replay_record_parse_errors";
pub const RECORDS_WITHOUT_CONNECTION: &str = "replay_records_without_connection";
pub const NON_GET_RECORDS: &str = "replay_non_get_records";
pub const DUPLICATE_TARGETS: &str = "replay_duplicate_targets";
pub const INVALID_TARGETS: &str = "replay_invalid_targets";
pub const TRACKED_TARGETS: &str = "replay_tracked_targets";
pub const REPLAYS_COMPLETED: &str = "replay_requests_completed";
pub const REPLAY_TRANSPORT_ERRORS: &str = "replay_transport_errors";
