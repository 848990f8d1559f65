mod packet;

pub use self::packet::{
    AudioDataStream, ConfigShrinkVideoStreamRequest, ConfigVideoStreamRequest,
    DumpRealtimeAudioRequest, DumpRealtimeVideoRequest, DumpVideoFrameRequest, GetVersionResponse,
    PacketHead, VideoDataStream,
};

pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// High byte of the packet `type` field.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum MainType {
    Request = 0,
    Response = 1,
    Data = 2,
}

/// Low byte of the packet `type` field. The handler table in the session
/// is indexed by these values.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum MessageType {
    Reset = 0,
    GetVersion = 1,
    ConfigVideoStream = 2,
    ConfigShrinkVideoStream = 3,
    DumpVideoFrame = 4,
    DumpRealtimeVideoFrame = 5,
    StopDumpVideoFrame = 6,
    DumpRealtimeAudioPage = 7,
    StopDumpAudioPage = 8,
}

impl MessageType {
    pub const COUNT: usize = 9;

    pub fn from_u8(value: u8) -> Option<MessageType> {
        match value {
            0 => Some(MessageType::Reset),
            1 => Some(MessageType::GetVersion),
            2 => Some(MessageType::ConfigVideoStream),
            3 => Some(MessageType::ConfigShrinkVideoStream),
            4 => Some(MessageType::DumpVideoFrame),
            5 => Some(MessageType::DumpRealtimeVideoFrame),
            6 => Some(MessageType::StopDumpVideoFrame),
            7 => Some(MessageType::DumpRealtimeAudioPage),
            8 => Some(MessageType::StopDumpAudioPage),
            _ => None,
        }
    }
}

/// Machine readable discriminator carried in the `error_code` field of a
/// response packet.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ErrorCode {
    Ok = 0,
    NonSupportCommand = 1,
    Argument = 2,
    RealtimeStreamExists = 3,
    VideoMemoryOverflowStop = 4,
    VideoMemoryOverflowDrop = 5,
    AudioMemoryOverflowStop = 6,
    AudioMemoryOverflowDrop = 7,
    MemoryAllocFail = 8,
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum RealtimeMode {
    NonRealtime = 0,
    StopWhenOverflow = 1,
    BestEffort = 2,
}

impl RealtimeMode {
    /// Modes a client may request. `NonRealtime` is the idle session
    /// state, not a request value.
    pub fn from_request(value: u8) -> Option<RealtimeMode> {
        match value {
            1 => Some(RealtimeMode::StopWhenOverflow),
            2 => Some(RealtimeMode::BestEffort),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_covers_low_byte_range() {
        for value in 0..MessageType::COUNT as u8 {
            let message_type = MessageType::from_u8(value).unwrap();
            assert_eq!(message_type as u8, value);
        }
        assert_eq!(MessageType::from_u8(MessageType::COUNT as u8), None);
        assert_eq!(MessageType::from_u8(0xFF), None);
    }

    #[test]
    fn realtime_mode_rejects_non_realtime_requests() {
        assert_eq!(RealtimeMode::from_request(0), None);
        assert_eq!(RealtimeMode::from_request(1), Some(RealtimeMode::StopWhenOverflow));
        assert_eq!(RealtimeMode::from_request(2), Some(RealtimeMode::BestEffort));
        assert_eq!(RealtimeMode::from_request(3), None);
    }
}
