use std::path::Path;

use loralog_store::SqliteStore;
use loralog_transport::SerialTransport;
use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        serial_device_check(&args.port),
        available_ports_check(),
        database_check(&args.database),
        compiled_features_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("loralog doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
    }
}

fn serial_device_check(port: &str) -> CheckResult {
    let listed = SerialTransport::available_ports()
        .iter()
        .any(|name| name == port);

    let (status, detail) = if listed {
        (CheckStatus::Pass, format!("{port} is present"))
    } else if Path::new(port).exists() {
        (
            CheckStatus::Warn,
            format!("{port} exists but was not enumerated as a serial port"),
        )
    } else {
        (CheckStatus::Fail, format!("{port} not found"))
    };

    CheckResult {
        name: "serial_device",
        status,
        detail,
    }
}

fn available_ports_check() -> CheckResult {
    let ports = SerialTransport::available_ports();
    let detail = if ports.is_empty() {
        "none".to_string()
    } else {
        ports.join(", ")
    };
    CheckResult {
        name: "serial_ports",
        status: CheckStatus::Info,
        detail,
    }
}

fn database_check(path: &Path) -> CheckResult {
    if !path.exists() {
        // Listening creates it; only the parent needs to be usable.
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let (status, detail) = if parent.is_dir() {
            (
                CheckStatus::Warn,
                format!("{} does not exist yet; it will be created", path.display()),
            )
        } else {
            (
                CheckStatus::Fail,
                format!("directory {} does not exist", parent.display()),
            )
        };
        return CheckResult {
            name: "database",
            status,
            detail,
        };
    }

    let result = SqliteStore::open(path).and_then(|store| store.count());
    match result {
        Ok(count) => CheckResult {
            name: "database",
            status: CheckStatus::Pass,
            detail: format!("{} holds {count} messages", path.display()),
        },
        Err(err) => CheckResult {
            name: "database",
            status: CheckStatus::Fail,
            detail: format!("{}: {err}", path.display()),
        },
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "api") {
        features.push("api");
    }
    if cfg!(feature = "async") {
        features.push("async");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult {
        name: "compiled_features",
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}
