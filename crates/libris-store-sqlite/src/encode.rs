//! Timestamps are stored as RFC 3339 strings.

use chrono::{DateTime, Utc};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }
