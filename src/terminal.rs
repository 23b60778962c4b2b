//! Terminal ownership and process-group state for interactive use.
//!
//! The shell claims leadership of its own process group at startup, takes
//! the terminal foreground, and ignores the job-control signals so it is
//! never suspended or killed while idle. Foreground children get the
//! terminal on loan and have those signals reset to their defaults.
//!
//! Signal disposition (`sigaction`) requires unsafe per POSIX; it is
//! confined to this module and to the child setup in `external`.

#[cfg(unix)]
#[allow(unsafe_code)]
mod unix {
    use std::io::IsTerminal;
    use std::os::unix::io::BorrowedFd;

    use anyhow::{Context, Result};
    use nix::sys::signal::{self, SigHandler, Signal};
    use nix::sys::termios::{self, SetArg, Termios};
    use nix::unistd::{self, Pid, tcgetpgrp, tcsetpgrp};

    /// The five job-control signals: interrupt, quit, keyboard stop, and
    /// the two terminal I/O stops. The idle shell ignores all of them; a
    /// foreground child restores default handling before exec.
    pub const JOB_CONTROL_SIGNALS: [Signal; 5] = [
        Signal::SIGINT,
        Signal::SIGQUIT,
        Signal::SIGTSTP,
        Signal::SIGTTIN,
        Signal::SIGTTOU,
    ];

    /// Get a borrowed fd for the controlling terminal (stdin).
    pub(crate) fn stdin_fd() -> BorrowedFd<'static> {
        // SAFETY: stdin (fd 0) stays open for the lifetime of the process.
        unsafe { BorrowedFd::borrow_raw(0) }
    }

    /// Install a fixed disposition (SIG_IGN or SIG_DFL) for a signal.
    pub(crate) fn set_disposition(sig: Signal, handler: SigHandler) -> nix::Result<()> {
        // SAFETY: only SIG_IGN/SIG_DFL are ever installed here, so no
        // handler code runs in signal context.
        unsafe {
            signal::sigaction(
                sig,
                &signal::SigAction::new(handler, signal::SaFlags::empty(), signal::SigSet::empty()),
            )?;
        }
        Ok(())
    }

    /// Terminal state owned by the shell session.
    ///
    /// Created once at startup; [`Drop`] restores the saved terminal modes
    /// exactly once at teardown.
    pub struct Terminal {
        interactive: bool,
        shell_pgid: Pid,
        saved_modes: Option<Termios>,
    }

    impl Terminal {
        /// Initialize terminal state for the session.
        ///
        /// When stdin is a terminal: wait until the shell's process group
        /// is the terminal's foreground group, put the shell in its own
        /// group, claim the terminal, ignore the job-control signals, and
        /// save the current terminal modes for restoration at exit.
        ///
        /// Failure to establish process-group or terminal ownership is
        /// fatal; the caller is expected to abort startup.
        pub fn init() -> Result<Self> {
            if !std::io::stdin().is_terminal() {
                return Ok(Self {
                    interactive: false,
                    shell_pgid: unistd::getpgrp(),
                    saved_modes: None,
                });
            }

            // Until the shell's group owns the terminal, politely stop
            // ourselves with SIGTTIN the way a background job would be.
            loop {
                let foreground =
                    tcgetpgrp(stdin_fd()).context("cannot read terminal foreground group")?;
                let pgrp = unistd::getpgrp();
                if foreground == pgrp {
                    break;
                }
                let _ = signal::kill(Pid::from_raw(-pgrp.as_raw()), Signal::SIGTTIN);
            }

            let shell_pgid = unistd::getpid();
            match unistd::setpgid(shell_pgid, shell_pgid) {
                Ok(()) => {}
                // Already a session leader (e.g. spawned via setsid), which
                // means we already lead our own group.
                Err(nix::errno::Errno::EPERM) => {}
                Err(err) => {
                    return Err(err).context("couldn't put the shell in its own process group");
                }
            }

            // SIGTTOU must be ignored before tcsetpgrp or the call itself
            // would stop us.
            set_disposition(Signal::SIGTTOU, SigHandler::SigIgn)
                .context("cannot ignore SIGTTOU")?;
            tcsetpgrp(stdin_fd(), shell_pgid).context("cannot claim terminal foreground")?;
            for sig in [
                Signal::SIGINT,
                Signal::SIGQUIT,
                Signal::SIGTSTP,
                Signal::SIGTTIN,
            ] {
                set_disposition(sig, SigHandler::SigIgn)
                    .with_context(|| format!("cannot ignore {sig}"))?;
            }

            let saved_modes =
                termios::tcgetattr(stdin_fd()).context("cannot read terminal modes")?;
            tracing::debug!(pgid = shell_pgid.as_raw(), "shell owns the terminal");

            Ok(Self {
                interactive: true,
                shell_pgid,
                saved_modes: Some(saved_modes),
            })
        }

        /// A terminal that never touches process groups or the tty. Used
        /// when stdin is not a terminal and by tests.
        pub fn non_interactive() -> Self {
            Self {
                interactive: false,
                shell_pgid: unistd::getpgrp(),
                saved_modes: None,
            }
        }

        /// Whether the session is attached to an interactive terminal.
        pub fn interactive(&self) -> bool {
            self.interactive
        }

        /// The shell's own process group id.
        pub fn shell_pgid(&self) -> Pid {
            self.shell_pgid
        }

        /// Hand terminal foreground control to `pgid`. No-op when not
        /// interactive.
        pub fn give_terminal_to(&self, pgid: Pid) -> Result<()> {
            if self.interactive {
                tcsetpgrp(stdin_fd(), pgid).context("cannot hand terminal to child")?;
            }
            Ok(())
        }

        /// Reclaim terminal foreground control for the shell's group.
        /// No-op when not interactive.
        pub fn reclaim(&self) -> Result<()> {
            if self.interactive {
                tcsetpgrp(stdin_fd(), self.shell_pgid)
                    .context("cannot reclaim terminal for the shell")?;
            }
            Ok(())
        }
    }

    impl Drop for Terminal {
        fn drop(&mut self) {
            if let Some(modes) = self.saved_modes.take() {
                if let Err(err) = termios::tcsetattr(stdin_fd(), SetArg::TCSADRAIN, &modes) {
                    tracing::warn!("failed to restore terminal modes: {err}");
                }
            }
        }
    }
}

#[cfg(unix)]
pub use unix::{JOB_CONTROL_SIGNALS, Terminal};
#[cfg(unix)]
pub(crate) use unix::{set_disposition, stdin_fd};

#[cfg(not(unix))]
mod stub {
    use anyhow::Result;

    /// Non-unix stub: never interactive, all handoffs are no-ops.
    pub struct Terminal {
        _private: (),
    }

    impl Terminal {
        pub fn init() -> Result<Self> {
            Ok(Self { _private: () })
        }

        pub fn non_interactive() -> Self {
            Self { _private: () }
        }

        pub fn interactive(&self) -> bool {
            false
        }
    }
}

#[cfg(not(unix))]
pub use stub::Terminal;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_terminal_is_inert() {
        let term = Terminal::non_interactive();
        assert!(!term.interactive());
    }

    #[test]
    #[cfg(unix)]
    fn handoff_is_a_no_op_without_a_tty() {
        let term = Terminal::non_interactive();
        term.give_terminal_to(term.shell_pgid()).unwrap();
        term.reclaim().unwrap();
    }
}
