//! Log setup for functions running on Lambda.
//!
//! Lambda stamps every line it captures, so the formatter only prints
//! `[app] - [LEVEL] - message fields`.

use std::fmt;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

struct AppFormat {
    app_name: String,
}

impl<S, N> FormatEvent<S, N> for AppFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}] - [{}] - ",
            self.app_name,
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber, writing to stdout.
///
/// `debug` selects the DEBUG level, otherwise only errors are emitted.
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
pub fn init(app_name: &str, debug: bool) -> bool {
    subscriber(app_name, debug, std::io::stdout).try_init().is_ok()
}

fn subscriber<W>(
    app_name: &str,
    debug: bool,
    writer: W,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level = if debug { Level::DEBUG } else { Level::ERROR };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(writer)
        .event_format(AppFormat {
            app_name: app_name.to_owned(),
        })
        .finish()
}
