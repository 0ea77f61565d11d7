//! i3-spawn-wait - launch a command and wait for its windows.
//!
//! Subscribes to i3's "window" events over IPC, spawns the command, and
//! blocks until the requested number of windows have been managed, so
//! scripts and keybindings can sequence "start program" then "act on its
//! window" without racing asynchronous window creation. With X11
//! integration enabled it also checks that each window is actually
//! viewable, optionally waits for it to take input focus, and runs an
//! I3_SYNC barrier after every event.
//!
//! # Examples
//!
//! ```bash
//! # Block until xterm's window is managed
//! i3-spawn-wait xterm -title "Rc Shell" -e rc
//!
//! # gimp opens several windows
//! i3-spawn-wait -n 4 gimp
//!
//! # Verify visibility and focus through the X server as well
//! i3-spawn-wait --focus xterm
//! ```

mod config;
mod error;
mod event;
mod ipc;
mod spawn;
mod wait;
mod x11;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use config::Config;
use error::Error;
use wait::NullGate;
use x11::X11Gate;

/// Launch a command and block until its i3 windows appear
#[derive(Parser, Debug)]
#[command(name = "i3-spawn-wait", version, about, long_about = None)]
struct Cli {
    /// Number of windows to wait for
    #[arg(
        short = 'n',
        long = "count",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    count: u32,

    /// Path to the i3 IPC socket (default: ask `i3 --get-socketpath`)
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Check mapping state and run an I3_SYNC barrier after every window
    #[arg(long)]
    sync: bool,

    /// Also wait for mapped windows to take input focus (implies --sync)
    #[arg(long)]
    focus: bool,

    /// Require sync replies to echo our token (implies --sync)
    #[arg(long)]
    strict_sync: bool,

    /// The command to run, with its arguments, passed through verbatim
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn run(cli: Cli) -> Result<(), Error> {
    let cfg = Config::load();

    let socket_path = match cli.socket {
        Some(path) => path,
        None => ipc::discover_socket_path()?,
    };

    let x11_enabled = cli.sync || cli.focus || cli.strict_sync || cfg.x11.enabled;
    let focus_enabled = cli.focus || cfg.x11.focus;
    let strict_sync = cli.strict_sync || cfg.x11.strict_sync;

    if x11_enabled {
        let focus = focus_enabled.then_some(cfg.x11.focus_strategy);
        let mut gate = X11Gate::connect(focus, strict_sync, cfg.poll)?;
        wait::run(&socket_path, &cli.command, cli.count, &mut gate)
    } else {
        wait::run(&socket_path, &cli.command, cli.count, &mut NullGate)
    }
}

fn main() {
    // Initialize logging; RUST_LOG=debug echoes protocol internals
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // -h/--help and -V are not failures; everything else is a
            // usage error and exits 1 rather than clap's default 2.
            let code = if err.use_stderr() { error::EXIT_LOGIC } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        process::exit(err.exit_code());
    }
}
