use byteorder::{ByteOrder, NetworkEndian};

use super::{ErrorCode, MainType, MessageType};

/// Fixed 8-byte header shared by request, response and data packets.
///
/// On the wire: `type:u16, error_code:u16, length:u32`, all network byte
/// order. `length` is the payload size and does not include the header.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct PacketHead {
    pub main_type: u8,
    pub message_type: u8,
    pub error_code: u16,
    pub length: u32,
}

impl PacketHead {
    pub const SIZE: usize = 8;

    pub fn request(message_type: MessageType, length: u32) -> PacketHead {
        PacketHead {
            main_type: MainType::Request as u8,
            message_type: message_type as u8,
            error_code: ErrorCode::Ok as u16,
            length,
        }
    }

    pub fn response(message_type: MessageType, error_code: ErrorCode, length: u32) -> PacketHead {
        PacketHead {
            main_type: MainType::Response as u8,
            message_type: message_type as u8,
            error_code: error_code as u16,
            length,
        }
    }

    pub fn data(message_type: MessageType, length: u32) -> PacketHead {
        PacketHead {
            main_type: MainType::Data as u8,
            message_type: message_type as u8,
            error_code: ErrorCode::Ok as u16,
            length,
        }
    }

    pub fn decode(buffer: &[u8]) -> PacketHead {
        let packet_type = NetworkEndian::read_u16(&buffer[0..2]);
        PacketHead {
            main_type: (packet_type >> 8) as u8,
            message_type: (packet_type & 0xFF) as u8,
            error_code: NetworkEndian::read_u16(&buffer[2..4]),
            length: NetworkEndian::read_u32(&buffer[4..8]),
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        let packet_type = (self.main_type as u16) << 8 | self.message_type as u16;
        NetworkEndian::write_u16(&mut buffer[0..2], packet_type);
        NetworkEndian::write_u16(&mut buffer[2..4], self.error_code);
        NetworkEndian::write_u32(&mut buffer[4..8], self.length);
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct GetVersionResponse {
    pub major: u8,
    pub minor: u8,
}

impl GetVersionResponse {
    pub const SIZE: usize = 2;

    pub fn decode(buffer: &[u8]) -> GetVersionResponse {
        GetVersionResponse {
            major: buffer[0],
            minor: buffer[1],
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        buffer[0] = self.major;
        buffer[1] = self.minor;
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct ConfigVideoStreamRequest {
    pub screen_width: u16,
    pub screen_height: u16,
}

impl ConfigVideoStreamRequest {
    pub const SIZE: usize = 4;

    pub fn decode(buffer: &[u8]) -> ConfigVideoStreamRequest {
        ConfigVideoStreamRequest {
            screen_width: NetworkEndian::read_u16(&buffer[0..2]),
            screen_height: NetworkEndian::read_u16(&buffer[2..4]),
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        NetworkEndian::write_u16(&mut buffer[0..2], self.screen_width);
        NetworkEndian::write_u16(&mut buffer[2..4], self.screen_height);
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct ConfigShrinkVideoStreamRequest {
    pub shrink_width: u8,
    pub shrink_height: u8,
}

impl ConfigShrinkVideoStreamRequest {
    pub const SIZE: usize = 2;

    pub fn decode(buffer: &[u8]) -> ConfigShrinkVideoStreamRequest {
        ConfigShrinkVideoStreamRequest {
            shrink_width: buffer[0],
            shrink_height: buffer[1],
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        buffer[0] = self.shrink_width;
        buffer[1] = self.shrink_height;
    }
}

/// A memory address of zero disables the channel.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct DumpVideoFrameRequest {
    pub memory_address1: u32,
    pub memory_address2: u32,
    pub number_of_frames: u16,
}

impl DumpVideoFrameRequest {
    pub const SIZE: usize = 10;

    pub fn decode(buffer: &[u8]) -> DumpVideoFrameRequest {
        DumpVideoFrameRequest {
            memory_address1: NetworkEndian::read_u32(&buffer[0..4]),
            memory_address2: NetworkEndian::read_u32(&buffer[4..8]),
            number_of_frames: NetworkEndian::read_u16(&buffer[8..10]),
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        NetworkEndian::write_u32(&mut buffer[0..4], self.memory_address1);
        NetworkEndian::write_u32(&mut buffer[4..8], self.memory_address2);
        NetworkEndian::write_u16(&mut buffer[8..10], self.number_of_frames);
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct DumpRealtimeVideoRequest {
    pub is_dual: u8,
    pub mode: u8,
}

impl DumpRealtimeVideoRequest {
    pub const SIZE: usize = 2;

    pub fn decode(buffer: &[u8]) -> DumpRealtimeVideoRequest {
        DumpRealtimeVideoRequest {
            is_dual: buffer[0],
            mode: buffer[1],
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        buffer[0] = self.is_dual;
        buffer[1] = self.mode;
    }
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct DumpRealtimeAudioRequest {
    pub mode: u8,
}

impl DumpRealtimeAudioRequest {
    pub const SIZE: usize = 1;

    pub fn decode(buffer: &[u8]) -> DumpRealtimeAudioRequest {
        DumpRealtimeAudioRequest { mode: buffer[0] }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        buffer[0] = self.mode;
    }
}

/// Header of a video data packet, followed by the raw frame bytes. Three
/// explicit padding bytes keep the pixel data 4-byte aligned.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct VideoDataStream {
    pub frame_number: u32,
    pub width: u16,
    pub height: u16,
    pub channel: u8,
}

impl VideoDataStream {
    pub const SIZE: usize = 12;

    pub fn decode(buffer: &[u8]) -> VideoDataStream {
        VideoDataStream {
            frame_number: NetworkEndian::read_u32(&buffer[0..4]),
            width: NetworkEndian::read_u16(&buffer[4..6]),
            height: NetworkEndian::read_u16(&buffer[6..8]),
            channel: buffer[8],
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        NetworkEndian::write_u32(&mut buffer[0..4], self.frame_number);
        NetworkEndian::write_u16(&mut buffer[4..6], self.width);
        NetworkEndian::write_u16(&mut buffer[6..8], self.height);
        buffer[8] = self.channel;
        buffer[9] = 0;
        buffer[10] = 0;
        buffer[11] = 0;
    }
}

/// Header of an audio data packet, followed by one 4 KiB page.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct AudioDataStream {
    pub page_count: u32,
}

impl AudioDataStream {
    pub const SIZE: usize = 4;

    pub fn decode(buffer: &[u8]) -> AudioDataStream {
        AudioDataStream {
            page_count: NetworkEndian::read_u32(&buffer[0..4]),
        }
    }

    pub fn encode(&self, buffer: &mut [u8]) {
        NetworkEndian::write_u32(&mut buffer[0..4], self.page_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{VERSION_MAJOR, VERSION_MINOR};

    #[test]
    fn packet_head_round_trip() {
        let head = PacketHead::response(MessageType::DumpVideoFrame, ErrorCode::Argument, 0x1234);
        let mut buffer = [0u8; PacketHead::SIZE];
        head.encode(&mut buffer);
        assert_eq!(PacketHead::decode(&buffer), head);
    }

    #[test]
    fn packet_head_is_network_byte_order() {
        let head = PacketHead::data(MessageType::DumpRealtimeAudioPage, 0x0102_0304);
        let mut buffer = [0u8; PacketHead::SIZE];
        head.encode(&mut buffer);
        // type 0x0207, error 0, length 0x01020304, big endian
        assert_eq!(buffer, [0x02, 0x07, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn packet_head_splits_type_field() {
        let mut buffer = [0u8; PacketHead::SIZE];
        PacketHead::request(MessageType::GetVersion, 0).encode(&mut buffer);
        let head = PacketHead::decode(&buffer);
        assert_eq!(head.main_type, MainType::Request as u8);
        assert_eq!(head.message_type, MessageType::GetVersion as u8);
    }

    #[test]
    fn version_response_layout() {
        let mut buffer = [0u8; GetVersionResponse::SIZE];
        GetVersionResponse { major: VERSION_MAJOR, minor: VERSION_MINOR }.encode(&mut buffer);
        assert_eq!(buffer, [0x01, 0x00]);
    }

    #[test]
    fn dump_video_frame_request_layout() {
        let mut buffer = [0u8; DumpVideoFrameRequest::SIZE];
        let request = DumpVideoFrameRequest {
            memory_address1: 0xC100_0000,
            memory_address2: 0xC200_0000,
            number_of_frames: 5,
        };
        request.encode(&mut buffer);
        assert_eq!(
            buffer,
            [0xC1, 0x00, 0x00, 0x00, 0xC2, 0x00, 0x00, 0x00, 0x00, 0x05]
        );
        assert_eq!(DumpVideoFrameRequest::decode(&buffer), request);
    }

    #[test]
    fn video_data_stream_pads_to_twelve_bytes() {
        let mut buffer = [0xFFu8; VideoDataStream::SIZE];
        let stream = VideoDataStream {
            frame_number: 7,
            width: 1920,
            height: 1080,
            channel: 1,
        };
        stream.encode(&mut buffer);
        assert_eq!(&buffer[9..12], &[0, 0, 0]);
        assert_eq!(VideoDataStream::decode(&buffer), stream);
    }
}
