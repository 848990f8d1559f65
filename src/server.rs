use std::io;
use std::mem;
use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::result;
use std::sync::Arc;
use std::thread;

use log::{error, info, warn};
use thiserror::Error;

use crate::hw::{BoardRegisters, DevMem};
use crate::session::Session;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug,Error)]
pub enum Error {
    #[error("failed to open server socket: {0}")]
    Socket(io::Error),
    #[error("failed to set SO_REUSEADDR: {0}")]
    ReuseAddr(io::Error),
    #[error("failed to bind port {0}: {1}")]
    Bind(u16, io::Error),
    #[error("failed to listen on server socket: {0}")]
    Listen(io::Error),
    #[error("failed to accept client: {0}")]
    Accept(io::Error),
}

/*
 * Serve one audio and one video client at the same time without the
 * client handling retry.
 */
const LISTEN_BACKLOG: libc::c_int = 2;

/// The listener socket. Accepts clients forever and hands each one to a
/// session worker thread.
pub struct StreamServer {
    fd: RawFd,
}

impl StreamServer {
    /// Bind `0.0.0.0:port` with address reuse so the port can be taken
    /// again right after an unexpected exit.
    ///
    /// `std::net::TcpListener` offers no control over the backlog, so the
    /// listener is set up with libc directly.
    pub fn bind(port: u16) -> Result<StreamServer> {
        let fd = unsafe { libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0) };
        if fd < 0 {
            return Err(Error::Socket(io::Error::last_os_error()));
        }
        let server = StreamServer { fd };

        let sock_opt: libc::c_int = 1;
        let ret = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_REUSEADDR,
                &sock_opt as *const libc::c_int as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(Error::ReuseAddr(io::Error::last_os_error()));
        }

        let mut address: libc::sockaddr_in = unsafe { mem::zeroed() };
        address.sin_family = libc::AF_INET as libc::sa_family_t;
        address.sin_addr.s_addr = libc::INADDR_ANY;
        address.sin_port = port.to_be();
        let ret = unsafe {
            libc::bind(
                fd,
                &address as *const libc::sockaddr_in as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(Error::Bind(port, io::Error::last_os_error()));
        }

        let ret = unsafe { libc::listen(fd, LISTEN_BACKLOG) };
        if ret < 0 {
            return Err(Error::Listen(io::Error::last_os_error()));
        }

        Ok(server)
    }

    fn accept_client(&self) -> Result<(TcpStream, SocketAddrV4)> {
        let mut address: libc::sockaddr_in = unsafe { mem::zeroed() };
        let mut length = mem::size_of::<libc::sockaddr_in>() as libc::socklen_t;
        let client_fd = unsafe {
            libc::accept(
                self.fd,
                &mut address as *mut libc::sockaddr_in as *mut libc::sockaddr,
                &mut length,
            )
        };
        if client_fd < 0 {
            return Err(Error::Accept(io::Error::last_os_error()));
        }
        let socket = unsafe { TcpStream::from_raw_fd(client_fd) };
        let peer = SocketAddrV4::new(
            Ipv4Addr::from(u32::from_be(address.sin_addr.s_addr)),
            u16::from_be(address.sin_port),
        );
        Ok((socket, peer))
    }

    /// Accept clients forever, one session worker per connection. Each
    /// worker opens its own dev-mem handle for dump mappings.
    pub fn run(&self, board: Arc<dyn BoardRegisters>) -> Result<()> {
        loop {
            let (socket, peer) = self.accept_client()?;
            let id = socket.as_raw_fd();
            info!("client from {}, session {}", peer, id);

            let board = board.clone();
            let result = thread::Builder::new()
                .name(format!("session-{}", id))
                .spawn(move || {
                    let mapper = match DevMem::open() {
                        Ok(mem) => mem,
                        Err(err) => {
                            error!("session {}: {}", id, err);
                            return;
                        }
                    };
                    Session::new(socket, board, Box::new(mapper)).run();
                });
            if let Err(err) = result {
                warn!("could not create thread for session {}: {}", id, err);
            }
        }
    }
}

impl Drop for StreamServer {
    fn drop(&mut self) {
        unsafe { libc::close(self.fd) };
    }
}
