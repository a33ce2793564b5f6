//! `since` helper: human readable relative time.
//!
//! ```handlebars
//! {{since post.created}}   {{!-- unix seconds or "2024-06-15T14:30:45Z" --}}
//! ```

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
    html_escape,
};
use serde_json::Value as Json;

use crate::utils::date::{DateTimeUtc, unix_now};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;

/// Describe an elapsed duration given in seconds.
pub fn format_since(seconds: i64) -> String {
    match seconds {
        s if s < MINUTE => "< 1 minute ago".into(),
        s if s < 2 * MINUTE => "1 minute ago".into(),
        s if s < HOUR => format!("{} minutes ago", s / MINUTE),
        s if s < 2 * HOUR => "1 hour ago".into(),
        s if s < DAY => format!("{} hours ago", s / HOUR),
        s if s < 2 * DAY => "1 day ago".into(),
        s if s < MONTH => format!("{} days ago", s / DAY),
        s if s < 2 * MONTH => "1 month ago".into(),
        s if s < 12 * MONTH => format!("{} months ago", s / MONTH),
        _ => "> 1 year ago".into(),
    }
}

/// Unix seconds of a timestamp value (number or RFC 3339 string).
pub fn timestamp(value: &Json) -> Option<i64> {
    match value {
        // `as` saturates at the i64 bounds (NaN is not representable in JSON)
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Json::String(s) => DateTimeUtc::parse(s).map(DateTimeUtc::to_unix),
        _ => None,
    }
}

pub fn since_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h
        .param(0)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex("since", 0))?;
    let then = timestamp(param.value()).ok_or_else(|| {
        RenderErrorReason::Other(format!("since: `{}` is not a timestamp", param.value()))
    })?;

    out.write(&html_escape(&format_since(unix_now().saturating_sub(then))))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_since_thresholds() {
        assert_eq!(format_since(45), "< 1 minute ago");
        assert_eq!(format_since(60), "1 minute ago");
        assert_eq!(format_since(119), "1 minute ago");
        assert_eq!(format_since(120), "2 minutes ago");
        assert_eq!(format_since(HOUR), "1 hour ago");
        assert_eq!(format_since(3 * HOUR), "3 hours ago");
        assert_eq!(format_since(DAY + 1), "1 day ago");
        assert_eq!(format_since(5 * DAY), "5 days ago");
        assert_eq!(format_since(MONTH), "1 month ago");
        assert_eq!(format_since(3 * MONTH), "3 months ago");
        assert_eq!(format_since(360 * DAY), "> 1 year ago");
    }

    #[test]
    fn test_future_timestamps_are_recent() {
        assert_eq!(format_since(-30), "< 1 minute ago");
    }

    #[test]
    fn test_timestamp_values() {
        assert_eq!(timestamp(&json!(1_718_461_845)), Some(1_718_461_845));
        assert_eq!(
            timestamp(&json!("2024-06-15T14:30:45Z")),
            Some(1_718_461_845)
        );
        assert_eq!(timestamp(&json!("last tuesday")), None);
        assert_eq!(timestamp(&json!(null)), None);
    }

    #[test]
    fn test_out_of_range_timestamps() {
        assert_eq!(timestamp(&json!(1e300)), Some(i64::MAX));
        assert_eq!(timestamp(&json!(-1e300)), Some(i64::MIN));
        assert_eq!(timestamp(&json!(u64::MAX)), Some(i64::MAX));

        let mut registry = Handlebars::new();
        registry.register_helper("since", Box::new(since_helper));
        let render = |t: Json| registry.render_template("{{since t}}", &json!({ "t": t })).unwrap();

        assert_eq!(render(json!(i64::MIN)), "&gt; 1 year ago");
        assert_eq!(render(json!(i64::MAX)), "&lt; 1 minute ago");
    }
}
