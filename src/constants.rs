use core::time::Duration;

use bytes_utils::Str;

pub(crate) const LF: char = '\n';
pub(crate) const COLON: char = ':';

/// Two consecutive line feeds terminate a frame
pub(crate) const FRAME_DELIMITER: &[u8; 2] = b"\n\n";

const BOM_CHAR: char = '\u{FEFF}';
const BOM_LEN: usize = BOM_CHAR.len_utf8();
// bom           = %xFEFF ; U+FEFF BYTE ORDER MARK
pub(crate) const BOM: &[u8; BOM_LEN] = &{
    let mut buf = [0u8; BOM_LEN];
    BOM_CHAR.encode_utf8(&mut buf);
    buf
};

pub(crate) const EMPTY_STR: Str = Str::from_static("");

/// Event type used when a frame carries no `event` field
pub const DEFAULT_EVENT_TYPE: &str = "message";
pub(crate) const MESSAGE_STR: Str = Str::from_static(DEFAULT_EVENT_TYPE);

/// Reconnect delay used until the server sends a `retry` field
pub const DEFAULT_RETRY: Duration = Duration::from_millis(3000);

pub(crate) const EVENT_STREAM_MIME: &str = "text/event-stream";
pub(crate) const NO_CACHE: &str = "no-cache";
pub(crate) const LAST_EVENT_ID: &str = "last-event-id";
