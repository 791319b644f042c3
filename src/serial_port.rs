use std::{fs::File, io::{self, Error, Read, Write}, os::fd::{AsRawFd, BorrowedFd, FromRawFd}, path::Path, time::Instant};

use nix::{errno::Errno, poll::{PollFd, PollFlags, PollTimeout}};
use termios::{speed_t, Termios};


/// Open the tty under the given path for non blocking access, in raw mode, at the given baud rate.
///
/// # Safety
///
/// The fd passed to `File::from_raw_fd` is owned and open because it comes
/// straight from the fcntl::open call. Wrapping it before any termios call
/// makes the `File` close it on every error path below.
pub fn port_open(path: impl AsRef<Path>, baud_rate: u32) -> io::Result<File> {
    use nix::fcntl::OFlag;
    use nix::sys::stat::Mode;

    let speed = baud_to_speed(baud_rate)?;

    let oflag =
        // Open for reading and writing.
        OFlag::O_RDWR |
        // Write I/O operations shall complete as defined by synchronized I/O data integrity completion
        OFlag::O_DSYNC |
        // Write I/O operations shall complete as defined by synchronized I/O file integrity completion.
        OFlag::O_SYNC |
        // open() shall not cause the terminal device to become the controlling terminal for the process.
        OFlag::O_NOCTTY |
        // open() function shall return without blocking for the device to be ready or available
        OFlag::O_NONBLOCK;

    let fd = nix::fcntl::open(path.as_ref(), oflag, Mode::empty())?;
    let file = unsafe {
        File::from_raw_fd(fd)
    };

    let mut termios = Termios::from_fd(file.as_raw_fd())?;
    termios::cfmakeraw(&mut termios);
    termios::cfsetspeed(&mut termios, speed)?;
    termios::tcsetattr(file.as_raw_fd(), termios::TCSANOW, &termios)?;

    Ok(file)
}


/// Map a numeric baud rate onto the termios speed constant.
pub fn baud_to_speed(baud_rate: u32) -> io::Result<speed_t> {
    use termios::os::linux::{B115200, B230400, B57600};
    let speed = match baud_rate {
        1200 => termios::B1200,
        2400 => termios::B2400,
        4800 => termios::B4800,
        9600 => termios::B9600,
        19200 => termios::B19200,
        38400 => termios::B38400,
        57600 => B57600,
        115200 => B115200,
        230400 => B230400,
        other => {
            return Err(Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported baud rate {other}"),
            ))
        }
    };
    Ok(speed)
}


#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum PollKind {
    ForRead,
    ForWrite,
}


#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum PollResult {
    TimedOut,
    /// A signal arrived before the port became ready or the deadline passed.
    Interrupted,
    ReadReady,
    WriteReady,
    Undocumented,
}


/// Poll the port to check if a read or write can be performed.
///
/// Blocks until the port becomes ready or the deadline passes.
///
/// # Safety
///
/// The fd remains open and valid for the duration of the returned BorrowedFd object
/// because we borrow a raw pointer from the `&File` only for the duration of the function.
pub fn port_poll(port: &File, poll: PollKind, deadline: Instant) -> io::Result<PollResult> {
    let fd = unsafe {
        BorrowedFd::borrow_raw(port.as_raw_fd())
    };
    let time_left = deadline.saturating_duration_since(Instant::now());
    let timeout = PollTimeout::try_from(time_left).unwrap_or(PollTimeout::ZERO);
    let input_flags = match poll {
        PollKind::ForRead => {
            PollFlags::POLLIN |
            PollFlags::POLLPRI |
            PollFlags::POLLRDNORM |
            PollFlags::POLLRDBAND
        },
        PollKind::ForWrite => {
            PollFlags::POLLPRI |
            PollFlags::POLLOUT |
            PollFlags::POLLWRNORM |
            PollFlags::POLLWRBAND
        },
    };
    let mut pollfd = [PollFd::new(fd, input_flags)];
    match nix::poll::poll(&mut pollfd, timeout) {
        // Upon failure, poll() shall return -1 and set errno to indicate the error.
        Err(Errno::EINTR) => Ok(PollResult::Interrupted),
        Err(errno) => Err(Error::from(errno)),
        Ok(rc) if rc < 0 => Err(Error::from(Errno::last())),
        // A value of 0 indicates that the call timed out and no file descriptors have been selected.
        Ok(0) => Ok(PollResult::TimedOut),
        Ok(_) => {
            let Some(revents) = pollfd[0].revents() else {
                return Ok(PollResult::TimedOut);
            };

            if revents.intersects(PollFlags::POLLHUP) {
                return Err(Error::other("POLLHUP: Device has been disconnected"));
            }
            if revents.intersects(PollFlags::POLLNVAL) {
                return Err(Error::other("POLLNVAL: Invalid fd member"));
            }
            if revents.intersects(PollFlags::POLLERR) {
                return Err(Error::other("POLLERR: An error has occurred"));
            }

            let pf_write_ready =
                PollFlags::POLLOUT |
                PollFlags::POLLWRNORM |
                PollFlags::POLLWRBAND;
            if poll == PollKind::ForWrite && revents.intersects(pf_write_ready) {
                return Ok(PollResult::WriteReady);
            }

            let pf_read_ready =
                PollFlags::POLLIN |
                PollFlags::POLLRDNORM |
                PollFlags::POLLRDBAND |
                PollFlags::POLLPRI;
            if revents.intersects(pf_read_ready) {
                return Ok(PollResult::ReadReady);
            }

            Ok(PollResult::Undocumented)
        }
    }
}


/// Read whatever is available from the port without growing `data` past `limit` bytes.
/// EOF, Interrupt, TimedOut and WouldBlock end the read without an error.
pub fn port_read(port: &mut File, data: &mut Vec<u8>, limit: usize) -> io::Result<()> {
    let mut buf = [0; 256];
    while data.len() < limit {
        let want = (limit - data.len()).min(buf.len());
        match port.read(&mut buf[..want]) {
            Ok(0) => return Ok(()),
            Ok(n) => data.extend_from_slice(&buf[..n]),
            Err(err) => match err.kind() {
                io::ErrorKind::Interrupted
                | io::ErrorKind::TimedOut
                | io::ErrorKind::WouldBlock => return Ok(()),
                _ => return Err(err),
            },
        }
    }
    Ok(())
}


/// Write some of `data` to the port and return how many bytes went out.
/// Interrupt, TimedOut and WouldBlock count as zero bytes written.
pub fn port_write(port: &mut File, data: &[u8]) -> io::Result<usize> {
    match port.write(data) {
        Ok(n) => Ok(n),
        Err(err) => match err.kind() {
            io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock => Ok(0),
            _ => Err(err),
        },
    }
}


/// Send all data to the port or fail with `TimedOut` once the deadline passes.
/// Bytes that arrive while sending are collected into `recv`, up to `recv_limit`.
pub fn port_send(port: &mut File, send: &[u8], recv: &mut Vec<u8>, recv_limit: usize, deadline: Instant) -> io::Result<()> {
    let mut sent = 0;

    loop {
        match port_poll(port, PollKind::ForWrite, deadline)? {
            PollResult::WriteReady => {
                sent += port_write(port, &send[sent..])?;
            },
            PollResult::ReadReady => {
                // The device is talking while we write
                port_read(port, recv, recv_limit)?;
            },
            PollResult::TimedOut | PollResult::Interrupted | PollResult::Undocumented => {}
        }

        if sent == send.len() {
            return Ok(());
        }

        if deadline <= Instant::now() {
            return Err(Error::new(
                io::ErrorKind::TimedOut,
                format!("only {sent} of {} bytes written", send.len()),
            ));
        }
    }
}


/// Receive data from the port until `buff` holds `limit` bytes or the deadline passes.
pub fn port_recv(port: &mut File, buff: &mut Vec<u8>, limit: usize, deadline: Instant) -> io::Result<()> {
    while buff.len() < limit {
        match port_poll(port, PollKind::ForRead, deadline)? {
            PollResult::TimedOut => return Ok(()),
            PollResult::ReadReady => port_read(port, buff, limit)?,
            PollResult::Interrupted | PollResult::WriteReady | PollResult::Undocumented => {}
        }

        if deadline <= Instant::now() {
            return Ok(());
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::{os::fd::AsRawFd, thread, time::Duration};

    use nix::{
        fcntl::OFlag,
        pty::{grantpt, posix_openpt, ptsname_r, unlockpt, PtyMaster},
        sys::pthread::{pthread_kill, pthread_self},
        sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal},
    };

    use super::*;

    extern "C" fn ignore_signal(_: nix::libc::c_int) {}

    fn open_pty() -> (PtyMaster, File) {
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).unwrap();
        grantpt(&master).unwrap();
        unlockpt(&master).unwrap();
        let slave = port_open(ptsname_r(&master).unwrap(), 38400).unwrap();
        (master, slave)
    }

    #[test]
    fn recv_keeps_waiting_after_a_signal() {
        let handler = SigAction::new(
            SigHandler::Handler(ignore_signal),
            SaFlags::empty(),
            SigSet::empty(),
        );
        unsafe { sigaction(Signal::SIGUSR1, &handler) }.unwrap();

        let (master, mut slave) = open_pty();
        let writer_fd = nix::unistd::dup(master.as_raw_fd()).unwrap();
        let mut writer = unsafe { File::from_raw_fd(writer_fd) };
        let reader = pthread_self();

        let interrupter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            pthread_kill(reader, Signal::SIGUSR1).unwrap();
            thread::sleep(Duration::from_millis(150));
            writer.write_all(b"OK\r\n").unwrap();
        });

        let start = Instant::now();
        let mut buff = Vec::new();
        port_recv(&mut slave, &mut buff, 100, start + Duration::from_millis(600)).unwrap();
        let elapsed = start.elapsed();
        interrupter.join().unwrap();

        assert_eq!(buff, b"OK\r\n");
        assert!(elapsed >= Duration::from_millis(550), "returned after {elapsed:?}");
        drop(master);
    }

    #[test]
    fn recv_stops_at_the_limit() {
        let (mut master, mut slave) = open_pty();
        master.write_all(&[b'x'; 150]).unwrap();

        let start = Instant::now();
        let mut buff = Vec::new();
        port_recv(&mut slave, &mut buff, 100, start + Duration::from_secs(2)).unwrap();

        assert_eq!(buff.len(), 100);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn common_baud_rates_map_to_termios() {
        assert_eq!(baud_to_speed(38400).unwrap(), termios::B38400);
        assert_eq!(baud_to_speed(9600).unwrap(), termios::B9600);
    }

    #[test]
    fn odd_baud_rates_are_invalid_input() {
        let err = baud_to_speed(12345).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn opening_a_missing_device_fails() {
        let err = port_open("/dev/aten-ctrl-does-not-exist", 38400).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
