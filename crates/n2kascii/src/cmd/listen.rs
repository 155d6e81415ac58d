use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use n2kascii_codec::WireMessage;
use n2kascii_gateway::{Gateway, GatewayConfig};
use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{gateway_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = resolve_config(&args)?;

    // Printing stands in for the bus: every message a client sends ends here.
    let printed = Rc::new(Cell::new(0usize));
    let bus_printed = Rc::clone(&printed);
    let pgns = args.pgns.clone();
    let bus = move |message: &WireMessage| -> n2kascii_gateway::Result<()> {
        if let Some(pgns) = &pgns {
            if !pgns.contains(&message.pgn) {
                return Ok(());
            }
        }
        print_message(message, format);
        bus_printed.set(bus_printed.get().saturating_add(1));
        Ok(())
    };

    let mut gateway = Gateway::bind(config, bus).map_err(|err| gateway_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let interval = gateway.pump_interval();
    while running.load(Ordering::SeqCst) {
        gateway
            .poll()
            .map_err(|err| gateway_error("gateway poll failed", err))?;

        if let Some(count) = args.count {
            if printed.get() >= count {
                break;
            }
        }
        thread::sleep(interval);
    }

    let counters = gateway.counters();
    let stats = gateway.pump_stats();
    info!(
        clients = counters.clients(),
        printed = printed.get(),
        lines = stats.lines,
        rejected = stats.rejected,
        "listen finished"
    );
    Ok(SUCCESS)
}

fn resolve_config(args: &ListenArgs) -> CliResult<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => {
            GatewayConfig::from_file(path).map_err(|err| gateway_error("config failed", err))?
        }
        None => GatewayConfig::default(),
    };

    if let Some(addr) = &args.addr {
        config.bind = addr.clone();
    }
    if let Some(source) = args.default_source {
        config.default_source = source;
    }
    if let Some(ms) = args.accept_interval_ms {
        config.accept_interval_ms = ms;
    }
    if let Some(ms) = args.pump_interval_ms {
        config.pump_interval_ms = ms;
    }
    Ok(config)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
