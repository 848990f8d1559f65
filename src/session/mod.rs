mod dump;


use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;
use std::result;
use std::sync::Arc;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::hw::{BoardRegisters, DumpMapper, MappedRegion};
use crate::protocol::{
    ConfigShrinkVideoStreamRequest, ConfigVideoStreamRequest, ErrorCode, GetVersionResponse,
    MainType, MessageType, PacketHead, RealtimeMode, VERSION_MAJOR, VERSION_MINOR,
};

pub type Result<T> = result::Result<T, Error>;

/// Errors that end the session. Requests rejected with an error response
/// are not errors at this level, the session keeps serving.
#[derive(Debug,Error)]
pub enum Error {
    #[error("i/o error on session socket: {0}")]
    Io(#[from] io::Error),
    #[error("client disconnected")]
    Disconnected,
    #[error("short read from socket: {0} bytes, expected {1}")]
    ShortRead(usize, usize),
    #[error("short write to socket: {0} bytes, expected {1}")]
    ShortWrite(usize, usize),
    #[error("request length {0} exceeds receive buffer size {1}")]
    OversizeRequest(usize, usize),
    #[error("unexpected main type 0x{0:x}")]
    MainType(u8),
    #[error("unknown message type {0}")]
    MessageType(u8),
    #[error("hardware overflow outside an active realtime mode")]
    RealtimeState,
}

pub const MAX_SOCKET_BUFFER_SIZE: usize = 2048;
pub const MAX_VIDEO_DUMP_CHANNEL: usize = 2;

pub(crate) const BYTES_PER_PIXEL: usize = 3;
pub(crate) const AUDIO_PAGE_SIZE: usize = 4096;

const ERROR_MESSAGE_MMAP: &str = "Memory map fail";
const ERROR_MESSAGE_MEMORY_ALLOC: &str = "Memory allocate fail";
const ERROR_MESSAGE_REALTIME_MODE: &str = "Realtime mode is wrong";
const ERROR_MESSAGE_REALTIME_STREAM: &str = "There is an existing realtime stream";
const ERROR_MESSAGE_REALTIME_NON_SAME: &str = "Width or height or limit is not the same";
const ERROR_MESSAGE_FRAME_NUMBER_ZERO: &str = "Frame number is 0";
const ERROR_MESSAGE_2ND_CHANNEL_NOT_RUN: &str = "2nd channel is not running";
const ERROR_MESSAGE_NOT_RUN: &str = "Capture HW is not running";
const ERROR_MESSAGE_DUMP_MEMORY_NOT_ENOUGH: &str = "Dump memory is not enough";
const ERROR_MESSAGE_MEMORY_OVERFLOW: &str =
    "Stop dump realtime audio/video due to memory overflow";

type Handler = fn(&mut Session) -> Result<()>;

/* Indexed by message type. */
const HANDLERS: [Handler; MessageType::COUNT] = [
    Session::process_reset,
    Session::process_get_version,
    Session::process_config_video_stream,
    Session::process_config_shrink_video_stream,
    Session::process_dump_video_frame,
    Session::process_dump_realtime_video_frame,
    Session::process_stop_dump,
    Session::process_dump_realtime_audio_page,
    Session::process_stop_dump,
];

/// Per-connection protocol state machine.
///
/// A session owns its socket, its dump buffer and its memory mappings. The
/// only shared state is the read-only board register view. One realtime
/// stream at most is active per session; audio and video dumps share the
/// dump state fields.
pub struct Session {
    socket: TcpStream,
    id: i32,
    board: Arc<dyn BoardRegisters>,
    mapper: Box<dyn DumpMapper>,

    /// Scratch buffer reused for every request receive and response send.
    /// A handler fully consumes the inbound payload before it builds a
    /// response in place.
    buffer: [u8; MAX_SOCKET_BUFFER_SIZE],
    message_type: MessageType,

    screen_width: u16,
    screen_height: u16,
    is_shrink: bool,
    shrink_width: u8,
    shrink_height: u8,

    /// Frames and pages are first copied out of the mapped ring into this
    /// buffer. Streaming straight out of the uncached mapping is far too
    /// slow.
    dump_buffer: Vec<u8>,
    stop_dump: bool,
    is_dump_audio: bool,
    realtime_check_channel: usize,
    dump_limit: u32,
    dump_addresses: [u32; MAX_VIDEO_DUMP_CHANNEL],
    unit_aligned_size: usize,
    mmap_size: usize,
    mmap_sources: [Option<Box<dyn MappedRegion>>; MAX_VIDEO_DUMP_CHANNEL],
    realtime_mode: RealtimeMode,
}

impl Session {
    pub fn new(
        socket: TcpStream,
        board: Arc<dyn BoardRegisters>,
        mapper: Box<dyn DumpMapper>,
    ) -> Session {
        let id = socket.as_raw_fd();
        Session {
            socket,
            id,
            board,
            mapper,
            buffer: [0; MAX_SOCKET_BUFFER_SIZE],
            message_type: MessageType::Reset,
            screen_width: 0,
            screen_height: 0,
            is_shrink: false,
            shrink_width: 0,
            shrink_height: 0,
            dump_buffer: Vec::new(),
            stop_dump: false,
            is_dump_audio: false,
            realtime_check_channel: 0,
            dump_limit: 0,
            dump_addresses: [0; MAX_VIDEO_DUMP_CHANNEL],
            unit_aligned_size: 0,
            mmap_size: 0,
            mmap_sources: [None, None],
            realtime_mode: RealtimeMode::NonRealtime,
        }
    }

    /// Serve requests until the client disconnects or a protocol or i/o
    /// error ends the session. Mappings, dev-mem handle and socket are
    /// released when the session is dropped.
    pub fn run(mut self) {
        debug!("session {}: start", self.id);
        loop {
            if let Err(err) = self.process_message() {
                match err {
                    Error::Disconnected => info!("session {}: client disconnected", self.id),
                    err => error!("session {}: {}", self.id, err),
                }
                break;
            }
        }
        info!("session {}: cleaning up", self.id);
    }

    /// Read one whole request and dispatch it. Also called from inside the
    /// realtime dump loops when the socket polls readable.
    fn process_message(&mut self) -> Result<()> {
        self.read_from_socket(PacketHead::SIZE)?;
        let head = PacketHead::decode(&self.buffer);

        if head.main_type != MainType::Request as u8 {
            error!(
                "session {}: main type 0x{:x} is not a request",
                self.id, head.main_type
            );
            return Err(Error::MainType(head.main_type));
        }

        let message_type = match MessageType::from_u8(head.message_type) {
            Some(message_type) => message_type,
            None => {
                error!(
                    "session {}: message type {} out of range",
                    self.id, head.message_type
                );
                return Err(Error::MessageType(head.message_type));
            }
        };

        let length = head.length as usize;
        if length > 0 {
            self.read_from_socket(length)?;
        }

        self.message_type = message_type;
        info!(
            "session {}: receive type {}, length {}",
            self.id, head.message_type, length
        );

        HANDLERS[message_type as usize](self)
    }

    fn read_from_socket(&mut self, size: usize) -> Result<()> {
        if size > MAX_SOCKET_BUFFER_SIZE {
            warn!(
                "session {}: reading size {} > buffer size {}",
                self.id, size, MAX_SOCKET_BUFFER_SIZE
            );
            return Err(Error::OversizeRequest(size, MAX_SOCKET_BUFFER_SIZE));
        }

        let read_bytes = self.socket.read(&mut self.buffer[..size])?;
        if read_bytes == 0 {
            return Err(Error::Disconnected);
        }
        if read_bytes != size {
            warn!(
                "session {}: read {} bytes, expected {}",
                self.id, read_bytes, size
            );
            return Err(Error::ShortRead(read_bytes, size));
        }
        Ok(())
    }

    /// Build a response for the message currently being processed in the
    /// scratch buffer and send it in one write.
    fn send_response(&mut self, error_code: ErrorCode, message: &[u8]) -> Result<()> {
        let head = PacketHead::response(self.message_type, error_code, message.len() as u32);
        head.encode(&mut self.buffer);
        self.buffer[PacketHead::SIZE..PacketHead::SIZE + message.len()].copy_from_slice(message);
        let size = PacketHead::SIZE + message.len();
        send_to_socket(&mut self.socket, self.id, &self.buffer[..size])
    }

    fn process_reset(&mut self) -> Result<()> {
        info!("session {}: process reset", self.id);
        if self.reject_when_realtime()? {
            return Ok(());
        }
        self.reset_state();
        self.send_response(ErrorCode::Ok, &[])
    }

    fn process_get_version(&mut self) -> Result<()> {
        info!(
            "session {}: get version {}.{}",
            self.id, VERSION_MAJOR, VERSION_MINOR
        );
        let response = GetVersionResponse {
            major: VERSION_MAJOR,
            minor: VERSION_MINOR,
        };
        let mut payload = [0u8; GetVersionResponse::SIZE];
        response.encode(&mut payload);
        self.send_response(ErrorCode::Ok, &payload)
    }

    fn process_config_video_stream(&mut self) -> Result<()> {
        let request = ConfigVideoStreamRequest::decode(&self.buffer);
        self.screen_width = request.screen_width;
        self.screen_height = request.screen_height;
        info!(
            "session {}: config video stream width {}, height {}",
            self.id, self.screen_width, self.screen_height
        );
        self.send_response(ErrorCode::Ok, &[])
    }

    fn process_config_shrink_video_stream(&mut self) -> Result<()> {
        let request = ConfigShrinkVideoStreamRequest::decode(&self.buffer);
        self.shrink_width = request.shrink_width;
        self.shrink_height = request.shrink_height;
        self.is_shrink = self.shrink_width != 0 || self.shrink_height != 0;
        info!(
            "session {}: config shrink width {}, shrink height {}",
            self.id, self.shrink_width, self.shrink_height
        );
        self.send_response(ErrorCode::Ok, &[])
    }

    /// Shared handler for both stop message types. The realtime loop is
    /// the only consumer of the flag.
    fn process_stop_dump(&mut self) -> Result<()> {
        info!(
            "session {}: stop dump, current mode {:?}",
            self.id, self.realtime_mode
        );
        if self.realtime_mode != RealtimeMode::NonRealtime {
            self.stop_dump = true;
        }
        self.send_response(ErrorCode::Ok, &[])
    }

    /// A session carries at most one realtime stream. Replies with an
    /// error response and reports true when one is active.
    fn reject_when_realtime(&mut self) -> Result<bool> {
        if self.realtime_mode == RealtimeMode::NonRealtime {
            return Ok(false);
        }
        warn!("session {}: {}", self.id, ERROR_MESSAGE_REALTIME_STREAM);
        self.send_response(
            ErrorCode::RealtimeStreamExists,
            ERROR_MESSAGE_REALTIME_STREAM.as_bytes(),
        )?;
        Ok(true)
    }

    fn reset_state(&mut self) {
        self.screen_width = 0;
        self.screen_height = 0;
        self.is_shrink = false;
        self.shrink_width = 0;
        self.shrink_height = 0;
        self.stop_dump = false;
        self.is_dump_audio = false;
        self.dump_limit = 0;
        self.realtime_mode = RealtimeMode::NonRealtime;
    }

    /// Release the dump buffer and mappings and leave realtime mode. Runs
    /// on every exit path of the dump handlers, so a failed request never
    /// leaks a mapping into the next one.
    fn clean_dump_state(&mut self) {
        self.dump_buffer = Vec::new();
        for i in 0..MAX_VIDEO_DUMP_CHANNEL {
            self.dump_addresses[i] = 0;
            self.mmap_sources[i] = None;
        }
        self.mmap_size = 0;
        self.realtime_mode = RealtimeMode::NonRealtime;
        self.is_dump_audio = false;
    }

    /// Allocate the single-unit copy buffer. Reports false after replying
    /// with an error response when the reservation fails.
    fn prepare_dump_buffer(&mut self) -> Result<bool> {
        info!(
            "session {}: allocate dump buffer {} bytes",
            self.id, self.unit_aligned_size
        );
        let mut buffer = Vec::new();
        if buffer.try_reserve_exact(self.unit_aligned_size).is_err() {
            self.send_response(
                ErrorCode::MemoryAllocFail,
                ERROR_MESSAGE_MEMORY_ALLOC.as_bytes(),
            )?;
            return Ok(false);
        }
        buffer.resize(self.unit_aligned_size, 0);
        self.dump_buffer = buffer;
        Ok(true)
    }

    /// Map every channel with a nonzero dump address for the whole ring.
    /// Reports false after replying with an error response when a mapping
    /// fails; whatever was already mapped is released by the caller's
    /// cleanup.
    fn prepare_mmap(&mut self) -> Result<bool> {
        self.mmap_size = self.dump_limit as usize * self.unit_aligned_size;

        for i in 0..MAX_VIDEO_DUMP_CHANNEL {
            if self.dump_addresses[i] == 0 {
                continue;
            }
            match self.mapper.map(self.dump_addresses[i], self.mmap_size) {
                Ok(region) => {
                    info!(
                        "session {}: mmap address 0x{:x}, size {} bytes",
                        self.id, self.dump_addresses[i], self.mmap_size
                    );
                    self.mmap_sources[i] = Some(region);
                }
                Err(err) => {
                    error!(
                        "session {}: cannot map source 0x{:x}: {}",
                        self.id, self.dump_addresses[i], err
                    );
                    self.send_response(ErrorCode::Argument, ERROR_MESSAGE_MMAP.as_bytes())?;
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Zero-timeout poll for readable or priority data on the socket.
    fn poll_socket(&mut self) -> Result<bool> {
        let mut poll_fd = libc::pollfd {
            fd: self.socket.as_raw_fd(),
            events: libc::POLLIN | libc::POLLPRI,
            revents: 0,
        };
        let ret = unsafe { libc::poll(&mut poll_fd, 1, 0) };
        if ret < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }
        Ok(ret > 0)
    }
}

/// Whole-buffer write. The C library reports a partial write on a blocking
/// socket only when interrupted, which ends the session like a disconnect.
fn send_to_socket(socket: &mut TcpStream, id: i32, data: &[u8]) -> Result<()> {
    let write_bytes = socket.write(data)?;
    if write_bytes == 0 {
        return Err(Error::Disconnected);
    }
    if write_bytes != data.len() {
        warn!(
            "session {}: wrote {} bytes, expected {}",
            id,
            write_bytes,
            data.len()
        );
        return Err(Error::ShortWrite(write_bytes, data.len()));
    }
    Ok(())
}
