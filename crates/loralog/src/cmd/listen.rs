use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use loralog_api::ApiConfig;
use loralog_frame::FramerConfig;
use loralog_service::{
    ConsoleSink, IngestConfig, IngestPipeline, IngestReport, QueryService, Shutdown,
    StopReason,
};
use loralog_store::{MemoryStore, MessageStore, SqliteStore};
use loralog_transport::{SerialConfig, SerialTransport};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cmd::{parse_duration, ListenArgs, SerialArgs};
use crate::exit::{
    io_error, store_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS,
};
use crate::output::OutputFormat;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, _format: OutputFormat) -> CliResult<i32> {
    let serial = serial_config(&args.serial)?;
    let refresh_interval = parse_duration(&args.refresh_interval)?;

    let store: Arc<dyn MessageStore> = if args.memory {
        Arc::new(MemoryStore::new())
    } else {
        let store = SqliteStore::open(&args.database)
            .map_err(|err| store_error("database open failed", err))?;
        Arc::new(store)
    };

    let shutdown = Shutdown::new();
    install_ctrlc_handler(shutdown.clone())?;

    let transport = SerialTransport::open(&serial)
        .map_err(|err| transport_error("serial open failed", err))?;

    let api = if args.no_api {
        None
    } else {
        let config = ApiConfig {
            host: args.host.clone(),
            port: args.api_port,
            refresh_interval,
        };
        Some(ApiServer::start(QueryService::new(Arc::clone(&store)), &config)?)
    };

    let config = IngestConfig {
        framer: FramerConfig {
            max_buffer: args.max_buffer,
        },
        skip_empty: args.skip_empty,
    };
    let mut pipeline = IngestPipeline::with_config(store, config);
    if !args.quiet {
        pipeline = pipeline.with_sink(ConsoleSink::stdout());
    }

    info!(port = %serial.port, baud_rate = serial.baud_rate, "listening for messages");
    let handle = pipeline
        .spawn(transport, shutdown.clone())
        .map_err(|err| io_error("ingest thread failed to start", err))?;
    finish(handle.join(), api, &shutdown)
}

/// Settle the command once the ingest thread has ended.
///
/// A failed ingest leaves the stored history readable: the API keeps
/// serving until shutdown is requested, and only then is the failure
/// reported as the exit status.
fn finish(
    joined: thread::Result<IngestReport>,
    api: Option<ApiServer>,
    shutdown: &Shutdown,
) -> CliResult<i32> {
    let outcome = match joined {
        Ok(report) => match report.stop {
            StopReason::Shutdown => Ok(SUCCESS),
            StopReason::TransportFailed(err) => Err(transport_error("serial read failed", err)),
        },
        Err(_) => Err(CliError::new(INTERNAL, "ingest thread panicked")),
    };

    if let Some(api) = api {
        if keep_serving(&outcome, shutdown) {
            if let Err(err) = &outcome {
                warn!(
                    error = %err,
                    addr = %api.local_addr(),
                    "ingestion stopped; HTTP API still serving history until shutdown"
                );
            }
            wait_for_shutdown(shutdown, SHUTDOWN_POLL);
        }
        // Readers may still be mid-request; the server drains them before exit.
        api.stop();
    }

    outcome
}

fn keep_serving(outcome: &CliResult<i32>, shutdown: &Shutdown) -> bool {
    outcome.is_err() && !shutdown.is_triggered()
}

fn wait_for_shutdown(shutdown: &Shutdown, poll: Duration) {
    while !shutdown.is_triggered() {
        thread::sleep(poll);
    }
}

pub(crate) fn serial_config(args: &SerialArgs) -> CliResult<SerialConfig> {
    Ok(SerialConfig {
        port: args.port.clone(),
        baud_rate: args.baud_rate,
        read_timeout: parse_duration(&args.read_timeout)?,
        ..SerialConfig::default()
    })
}

/// HTTP API running on its own runtime while ingestion owns the main flow.
struct ApiServer {
    addr: SocketAddr,
    runtime: Runtime,
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl ApiServer {
    fn start(query: QueryService, config: &ApiConfig) -> CliResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("loralog-api")
            .build()
            .map_err(|err| io_error("runtime setup failed", err))?;

        let listener = runtime
            .block_on(loralog_api::bind(config))
            .map_err(|err| io_error(&format!("bind {} failed", config.socket_addr()), err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| io_error("listener address unavailable", err))?;
        let app = loralog_api::router(query, config);

        let (stop, stopped) = oneshot::channel::<()>();
        let task = runtime.spawn(loralog_api::serve(listener, app, async move {
            let _ = stopped.await;
        }));

        Ok(Self {
            addr,
            runtime,
            stop,
            task,
        })
    }

    fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn stop(self) {
        let Self {
            runtime,
            stop,
            task,
            ..
        } = self;
        let _ = stop.send(());
        match runtime.block_on(task) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "HTTP API ended with an error"),
            Err(err) => warn!(error = %err, "HTTP API task failed"),
        }
    }
}

fn install_ctrlc_handler(shutdown: Shutdown) -> CliResult<()> {
    ctrlc::set_handler(move || {
        shutdown.trigger();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpStream;

    use loralog_service::IngestStats;
    use loralog_transport::TransportError;

    use super::*;
    use crate::exit::TRANSPORT_ERROR;

    fn local_api() -> ApiServer {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..ApiConfig::default()
        };
        ApiServer::start(QueryService::new(Arc::new(MemoryStore::new())), &config)
            .expect("api should start")
    }

    fn report(stop: StopReason) -> thread::Result<IngestReport> {
        Ok(IngestReport {
            stats: IngestStats::default(),
            stop,
        })
    }

    fn health(addr: SocketAddr) -> String {
        let mut stream = TcpStream::connect(addr).expect("api should accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn transport_failure_keeps_api_serving_until_shutdown() {
        let api = local_api();
        let addr = api.local_addr();
        let shutdown = Shutdown::new();

        let finisher = thread::spawn({
            let shutdown = shutdown.clone();
            move || {
                finish(
                    report(StopReason::TransportFailed(TransportError::Closed)),
                    Some(api),
                    &shutdown,
                )
            }
        });

        thread::sleep(Duration::from_millis(300));
        assert!(health(addr).contains("\"status\":\"ok\""));
        assert!(!finisher.is_finished());

        shutdown.trigger();
        let err = finisher.join().unwrap().unwrap_err();
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn requested_shutdown_stops_api_at_once() {
        let api = local_api();
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let code = finish(report(StopReason::Shutdown), Some(api), &shutdown).unwrap();
        assert_eq!(code, SUCCESS);
    }

    #[test]
    fn transport_failure_without_api_returns_immediately() {
        let shutdown = Shutdown::new();
        let err = finish(
            report(StopReason::TransportFailed(TransportError::Closed)),
            None,
            &shutdown,
        )
        .unwrap_err();
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn keep_serving_only_after_failure_without_shutdown() {
        let shutdown = Shutdown::new();
        assert!(!keep_serving(&Ok(SUCCESS), &shutdown));
        assert!(keep_serving(
            &Err(CliError::new(TRANSPORT_ERROR, "gone")),
            &shutdown
        ));
        shutdown.trigger();
        assert!(!keep_serving(
            &Err(CliError::new(TRANSPORT_ERROR, "gone")),
            &shutdown
        ));
    }

    #[test]
    fn serial_config_from_args() {
        let args = SerialArgs {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            read_timeout: "250ms".to_string(),
        };
        let config = serial_config(&args).unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert_eq!(config.chunk_size, SerialConfig::default().chunk_size);
    }

    #[test]
    fn bad_read_timeout_is_rejected() {
        let args = SerialArgs {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            read_timeout: "0s".to_string(),
        };
        assert!(serial_config(&args).is_err());
    }
}
