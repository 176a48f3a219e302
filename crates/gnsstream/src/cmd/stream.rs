use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gnsstream_client::{ClientConfig, StreamingClientService};
use tracing::{debug, error};

use crate::cmd::StreamArgs;
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_message, print_summary, OutputFormat};

/// How often the receive loop re-checks for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run a service for `config` and print messages until Ctrl-C, `--count`, or
/// the worker giving up.
pub fn run(config: ClientConfig, args: &StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let source = config.transport.endpoint();
    let mut service =
        StreamingClientService::new(config).map_err(|err| client_error("invalid options", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    if !service.start() {
        return Err(CliError::new(INTERNAL, "failed to start streaming service"));
    }

    let mut printed = 0u64;
    let mut gave_up = false;
    while running.load(Ordering::SeqCst) {
        match service.receive(true, Some(POLL_INTERVAL)) {
            Some(message) => {
                printed = printed.saturating_add(1);
                print_message(&message, printed, &source, format);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            None if !service.is_running() && service.pending() == 0 => {
                gave_up = true;
                break;
            }
            None => {}
        }
    }

    debug!(printed, gave_up, "stream loop finished");
    if service.is_running() {
        service.stop();
    }
    if args.summary {
        print_summary(&service.stats(), printed, &source, format);
    }

    if gave_up {
        error!(%source, "source unavailable");
        return Err(CliError::new(
            TRANSPORT_ERROR,
            format!("{source}: source unavailable and retry policy exhausted"),
        ));
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
