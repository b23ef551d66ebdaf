/// Format a media position as `mm:ss`
///
/// Minutes are not wrapped into hours, so a 75 minute position renders as
/// `75:00`.
pub fn format_media_time(position_ms: u64) -> String {
    let total_seconds = position_ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
