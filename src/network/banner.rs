use std::{env, net::SocketAddr};

use atty::Stream;
use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use sysinfo::System;

/// Полный баннер с информацией о брокере.
pub const ASCII_FULL: &str = r#"
    MQBroker {version}
    ----------------------------------------------
    Mode:             {mode}
    Listening:        {listen}
    Port:             {port}
    Connections:      {connections}
    Queues:           in-memory, FIFO per subscription
    PID:              {pid}
    Host:             {host}
    OS/Arch:          {os}/{arch}
    CPU(s):           {cpus}
    Memory:           {mem_value} {mem_unit}
    Git:              {git}
    Build:            {git} ({build_time})
"#;

/// Компактный баннер для вывода.
pub const ASCII_COMPACT: &str = r#"
MQBroker {version} | {mode} | {listen}:{port} | PID {pid}
"#;

/// Сведения, которые попадают в баннер.
#[derive(Debug, Clone)]
pub struct BannerInfo {
    pub version: String,
    pub mode: &'static str,
    pub listen: SocketAddr,
    pub max_connections: usize,
    pub pid: u32,
    pub host: String,
    pub cpus: usize,
    pub mem_value: f64,
    pub mem_unit: &'static str,
    pub git: &'static str,
    pub build_time: String,
}

impl BannerInfo {
    /// Собирает сведения о процессе и машине.
    pub fn collect(
        listen: SocketAddr,
        max_connections: usize,
    ) -> Self {
        let version = env!("CARGO_PKG_VERSION");
        // добавляем разрядность (32/64-bit) к версии
        let bits = std::mem::size_of::<usize>() * 8;

        let mut sys = System::new();
        sys.refresh_memory();

        // Расчет памяти
        let mem_total_kb = sys.total_memory() / 1024;
        let mem_total_mb = mem_total_kb as f64 / 1024.0;
        let mem_total_gb = mem_total_mb / 1024.0;
        let (mem_value, mem_unit) = if mem_total_gb >= 1.0 {
            (mem_total_gb, "GB")
        } else if mem_total_mb >= 1.0 {
            (mem_total_mb, "MB")
        } else {
            (mem_total_kb as f64, "KB")
        };

        // Git и время сборки
        let build_time_raw = option_env!("BUILD_TIME").unwrap_or("unknown");
        let build_time = match DateTime::parse_from_rfc3339(build_time_raw) {
            Ok(dt) => dt
                .with_timezone(&Local)
                .format("%d.%m.%Y %H:%M:%S")
                .to_string(),
            Err(_) => build_time_raw.to_string(),
        };

        Self {
            version: format!("{version} ({bits}-bit)"),
            mode: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
            listen,
            max_connections,
            pid: std::process::id(),
            host: System::host_name().unwrap_or_else(|| "unknown".into()),
            cpus: num_cpus::get(),
            mem_value,
            mem_unit,
            git: option_env!("GIT_COMMIT").unwrap_or("unknown"),
            build_time,
        }
    }

    fn connections(&self) -> String {
        match self.max_connections {
            0 => "unlimited".to_string(),
            n => format!("up to {n}"),
        }
    }

    /// Полный баннер без цвета.
    pub fn render_full(&self) -> String {
        ASCII_FULL
            .replace("{version}", &self.version)
            .replace("{mode}", self.mode)
            .replace("{listen}", &self.listen.ip().to_string())
            .replace("{port}", &self.listen.port().to_string())
            .replace("{connections}", &self.connections())
            .replace("{pid}", &self.pid.to_string())
            .replace("{host}", &self.host)
            .replace("{os}", env::consts::OS)
            .replace("{arch}", env::consts::ARCH)
            .replace("{cpus}", &self.cpus.to_string())
            .replace("{mem_value}", &format!("{:.1}", self.mem_value))
            .replace("{mem_unit}", self.mem_unit)
            .replace("{git}", self.git)
            .replace("{build_time}", &self.build_time)
    }

    /// Однострочный баннер без цвета.
    pub fn render_compact(&self) -> String {
        ASCII_COMPACT
            .replace("{version}", &self.version)
            .replace("{mode}", self.mode)
            .replace("{listen}", &self.listen.ip().to_string())
            .replace("{port}", &self.listen.port().to_string())
            .replace("{pid}", &self.pid.to_string())
    }
}

/// Вывод баннера брокера.
///
/// Режим задаётся `MQBROKER_BANNER=full|compact`; по умолчанию полный в debug
/// и компактный в release.
pub fn print_banner(
    listen: SocketAddr,
    max_connections: usize,
) {
    let forced = env::var("MQBROKER_BANNER").ok();
    let full = match forced.as_deref() {
        Some("full") => true,
        Some("compact") => false,
        _ => cfg!(debug_assertions),
    };

    let info = BannerInfo::collect(listen, max_connections);
    let color = atty::is(Stream::Stdout);
    let port = info.listen.port().to_string();
    let pid = info.pid.to_string();

    if full {
        let s = info.render_full();
        if !color {
            println!("{s}");
        } else {
            for (i, line) in s.lines().enumerate() {
                let trimmed = line.trim_start();
                if i == 1 {
                    println!("{}", line.bold().bright_blue());
                } else if trimmed.starts_with("Mode:") {
                    println!("{}", line.replace(info.mode, &info.mode.cyan().to_string()));
                } else if trimmed.starts_with("Port:") || trimmed.starts_with("PID:") {
                    println!(
                        "{}",
                        line.replace(&port, &port.magenta().to_string())
                            .replace(&pid, &pid.magenta().to_string())
                    );
                } else if trimmed.starts_with("Git:") || trimmed.starts_with("Build:") {
                    println!("{}", line.dimmed());
                } else {
                    println!("{line}");
                }
            }
        }
    } else {
        let s = info.render_compact();
        if color {
            println!("{}", s.bold().green());
        } else {
            println!("{s}");
        }
    }
    println!();
}

/// Лог запуска брокера с точностью до миллисекунд
pub fn print_startup_log() {
    let pid = std::process::id();
    let ts = Local::now().format("%d %b %Y %H:%M:%S%.3f").to_string();
    let version = env!("CARGO_PKG_VERSION");

    if atty::is(Stream::Stdout) {
        println!(
            "[{}] {} {} {}",
            pid.to_string().red(),
            ts.white(),
            "# Broker started, MQBroker version".dimmed().bold(),
            version.dimmed().bold()
        );
        println!(
            "[{}] {} {}",
            pid.to_string().red(),
            ts.white(),
            "* Ready to accept connections".green()
        );
    } else {
        println!("[{pid}] {ts} # Broker started, MQBroker version {version}");
        println!("[{pid}] {ts} * Ready to accept connections");
    }
}
