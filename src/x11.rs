//! X11 integration: mapping queries, focus waiting, and the sync barrier.
//!
//! i3 can emit the "window" event before its own layout state is consistent
//! enough for scripted follow-ups, so after every counted event one sync
//! round runs: a tagged I3_SYNC client message to the root, answered by i3
//! once it has caught up. The barrier runs even for unmapped windows.
//!
//! All long-lived X state (connection, atoms, the sync window) lives in
//! [`X11Gate`], constructed once and handed to the wait loop.

use std::time::Duration;

use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::config::{FocusStrategy, PollConfig};
use crate::error::Error;
use crate::wait::WindowGate;

/// Atoms used by the sync and focus machinery
struct Atoms {
    i3_sync: Atom,
    net_active_window: Atom,
}

impl Atoms {
    /// Create and intern all required atoms
    fn new(conn: &RustConnection) -> Result<Self, Error> {
        Ok(Self {
            i3_sync: Self::intern(conn, b"I3_SYNC")?,
            net_active_window: Self::intern(conn, b"_NET_ACTIVE_WINDOW")?,
        })
    }

    /// Intern an atom name
    fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom, Error> {
        Ok(conn.intern_atom(false, name)?.reply()?.atom)
    }
}

/// Mapping state of a window; only `Mapped` counts as visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    Unmapped,
    Unviewable,
    Mapped,
}

impl From<MapState> for MappingState {
    fn from(state: MapState) -> Self {
        if state == MapState::VIEWABLE {
            MappingState::Mapped
        } else if state == MapState::UNVIEWABLE {
            MappingState::Unviewable
        } else {
            MappingState::Unmapped
        }
    }
}

/// Shared X11 state: one connection, interned atoms, and the dedicated
/// sync window.
pub struct X11Gate {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    sync_window: Window,
    focus: Option<FocusStrategy>,
    strict_sync: bool,
    poll: PollConfig,
}

impl X11Gate {
    /// Connect to the X server and create the sync window.
    ///
    /// `focus` enables waiting for mapped windows to take input focus;
    /// `strict_sync` makes sync-reply matching verify the echoed token.
    pub fn connect(
        focus: Option<FocusStrategy>,
        strict_sync: bool,
        poll: PollConfig,
    ) -> Result<Self, Error> {
        let (conn, screen_num) = RustConnection::connect(None).map_err(Error::X11Connect)?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)?;

        // Dedicated, never-mapped window for the sync handshake: i3 sends
        // its reply to whichever window the signal names in data32[0].
        let sync_window = conn.generate_id()?;
        conn.create_window(
            0, // depth (copy from parent)
            sync_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            0, // visual (copy from parent)
            &CreateWindowAux::new(),
        )?;
        conn.flush()?;

        log::debug!(
            "connected to X, root 0x{:x}, sync window 0x{:x}",
            root,
            sync_window
        );

        Ok(Self {
            conn,
            root,
            atoms,
            sync_window,
            focus,
            strict_sync,
            poll,
        })
    }

    /// Current mapping state of `window`.
    fn mapping(&self, window: Window) -> Result<MappingState, Error> {
        let attrs = self.conn.get_window_attributes(window)?.reply()?;
        log::debug!("window 0x{:x} map_state {:?}", window, attrs.map_state);
        Ok(attrs.map_state.into())
    }

    /// The window EWMH says is active, if any.
    fn active_window(&self) -> Result<Option<Window>, Error> {
        let reply = self
            .conn
            .get_property(
                false,
                self.root,
                self.atoms.net_active_window,
                AtomEnum::WINDOW,
                0,
                1,
            )?
            .reply()?;
        Ok(reply.value32().and_then(|mut values| values.next()))
    }

    /// The window holding core-protocol input focus.
    fn input_focus(&self) -> Result<Window, Error> {
        Ok(self.conn.get_input_focus()?.reply()?.focus)
    }

    /// Busy-poll until `window` has focus, per the configured strategy.
    ///
    /// There is no push notification for "this specific window gained
    /// focus", hence the poll. It is unbounded unless `poll.max_checks`
    /// is set; exhausting a configured bound is a logical failure.
    fn wait_focus(&self, strategy: FocusStrategy, window: Window) -> Result<(), Error> {
        let interval = Duration::from_micros(self.poll.interval_us);
        let mut checks: u64 = 0;

        loop {
            let focused = match strategy {
                FocusStrategy::ActiveWindow => self.active_window()? == Some(window),
                FocusStrategy::InputFocus => self.input_focus()? == window,
            };
            if focused {
                log::debug!("window 0x{:x} took focus after {} checks", window, checks);
                return Ok(());
            }

            checks += 1;
            if self.poll.max_checks != 0 && checks >= self.poll.max_checks {
                return Err(Error::FocusTimeout { window, checks });
            }
            std::thread::sleep(interval);
        }
    }

    /// One sync-barrier round.
    ///
    /// Sends a tagged client message to the root with substructure-redirect
    /// semantics (fire-and-forget, like the window manager's own clients
    /// do), then blocks on the event stream until a client message comes
    /// back. No timeout: a manager that never answers hangs the wait.
    fn sync(&self) -> Result<(), Error> {
        let token = fastrand::u32(..);
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window: self.root,
            type_: self.atoms.i3_sync,
            data: ClientMessageData::from([self.sync_window, token, 0u32, 0u32, 0u32]),
        };
        self.conn
            .send_event(false, self.root, EventMask::SUBSTRUCTURE_REDIRECT, event)?;
        self.conn.flush()?;
        log::debug!("sent sync message with token {:#010x}", token);

        loop {
            let event = self.conn.wait_for_event()?;
            let Event::ClientMessage(reply) = event else {
                log::debug!("discarding unrelated event while syncing");
                continue;
            };

            let echoed = reply.data.as_data32();
            // Only one sync round is ever in flight, so matching on the
            // event kind alone suffices; i3's own test harness does the
            // same. Strict mode additionally insists on the token echo.
            if self.strict_sync && echoed[1] != token {
                log::debug!("ignoring client message with token {:#010x}", echoed[1]);
                continue;
            }

            log::debug!("sync reply via window 0x{:x}", echoed[0]);
            return Ok(());
        }
    }
}

impl WindowGate for X11Gate {
    fn settle(&mut self, window_id: i64) -> Result<(), Error> {
        // JSON carries the id as 64-bit; real X window ids fit in 32.
        let window = window_id as Window;

        if self.mapping(window)? == MappingState::Mapped {
            if let Some(strategy) = self.focus {
                self.wait_focus(strategy, window)?;
            }
        }

        self.sync()
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.conn.destroy_window(self.sync_window)?;
        self.conn.flush()?;
        Ok(())
    }
}
