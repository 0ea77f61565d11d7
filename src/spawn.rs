//! Fire-and-forget spawning of the target command.

use std::process::Command;

use crate::error::Error;

/// Spawn `argv` detached into its own session.
///
/// The argument vector is passed through verbatim: no shell, no word
/// splitting, no expansion. The child is never waited on; the only
/// synchronization with it happens indirectly, through the window manager's
/// observable state.
pub fn spawn_detached(argv: &[String]) -> Result<u32, Error> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::Usage("no command given".into()))?;

    let mut cmd = Command::new(program);
    cmd.args(args);

    // Detach into a new session so the command survives this process
    // exiting as soon as its windows have shown up.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
    }

    let child = cmd.spawn().map_err(|e| Error::Spawn {
        command: program.clone(),
        source: e,
    })?;

    log::info!("spawned '{}' (pid {})", program, child.id());
    Ok(child.id())
}
