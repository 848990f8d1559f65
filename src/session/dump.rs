use log::{debug, info, warn};

use super::{
    send_to_socket, Error, Result, Session, AUDIO_PAGE_SIZE, BYTES_PER_PIXEL,
    ERROR_MESSAGE_2ND_CHANNEL_NOT_RUN, ERROR_MESSAGE_DUMP_MEMORY_NOT_ENOUGH,
    ERROR_MESSAGE_FRAME_NUMBER_ZERO, ERROR_MESSAGE_MEMORY_OVERFLOW, ERROR_MESSAGE_NOT_RUN,
    ERROR_MESSAGE_REALTIME_MODE, ERROR_MESSAGE_REALTIME_NON_SAME, MAX_VIDEO_DUMP_CHANNEL,
};
use crate::protocol::{
    AudioDataStream, DumpRealtimeAudioRequest, DumpRealtimeVideoRequest, DumpVideoFrameRequest,
    ErrorCode, PacketHead, RealtimeMode, VideoDataStream,
};

/// The hardware unit counters are 16 bits wide.
const HW_COUNT_WRAP: u32 = 0x10000;

lazy_static! {
    static ref PAGE_SIZE: usize = unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize };
}

/// Round `size` up to a whole number of pages.
pub(crate) fn page_aligned_size(size: usize) -> usize {
    let page_size = *PAGE_SIZE;
    match size % page_size {
        0 => size,
        rem => size + page_size - rem,
    }
}

/// Units the hardware has produced past `count`, modulo the counter width.
/// The hardware count always runs in advance of the software count.
pub(crate) fn count_difference(hw_count: u32, count: u32) -> u32 {
    hw_count.wrapping_sub(count % HW_COUNT_WRAP) % HW_COUNT_WRAP
}

/// Outcome of matching the software count against the hardware counter.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
enum DumpStep {
    /// The hardware has not produced a new unit.
    NoProgress,
    /// Emit the unit at the current count, then continue at the carried
    /// count.
    Advance(u32),
    /// Overflow in best-effort mode: resume at the carried count without
    /// copying the lapped slot.
    Skip(u32),
    /// Overflow in stop mode: the notifier was sent, the stream ends
    /// cleanly.
    Stop,
}

/// Output geometry of emitted video frames, derived from the screen and
/// shrink configuration.
#[derive(Debug,Clone,Copy)]
struct VideoStreamFormat {
    width: u16,
    height: u16,
    frame_size: usize,
}

/// Keep one pixel, skip `shrink_width`; keep one row, skip
/// `shrink_height`. Returns the emitted byte count.
fn shrink_frame(
    source: &[u8],
    dest: &mut [u8],
    screen_width: usize,
    screen_height: usize,
    shrink_width: usize,
    shrink_height: usize,
) -> usize {
    let out_width = screen_width / (shrink_width + 1);
    let out_height = screen_height / (shrink_height + 1);
    let mut size = 0;
    for row in 0..out_height {
        let row_start = row * (shrink_height + 1) * screen_width * BYTES_PER_PIXEL;
        for col in 0..out_width {
            let pixel = row_start + col * (shrink_width + 1) * BYTES_PER_PIXEL;
            dest[size] = source[pixel];
            dest[size + 1] = source[pixel + 1];
            dest[size + 2] = source[pixel + 2];
            size += BYTES_PER_PIXEL;
        }
    }
    size
}

/// In-place variant of [`shrink_frame`] compacting the kept pixels to the
/// front of the buffer. The write index never passes the read index.
fn shrink_frame_in_place(
    frame: &mut [u8],
    screen_width: usize,
    screen_height: usize,
    shrink_width: usize,
    shrink_height: usize,
) -> usize {
    let out_width = screen_width / (shrink_width + 1);
    let out_height = screen_height / (shrink_height + 1);
    let mut size = 0;
    for row in 0..out_height {
        let row_start = row * (shrink_height + 1) * screen_width * BYTES_PER_PIXEL;
        for col in 0..out_width {
            let pixel = row_start + col * (shrink_width + 1) * BYTES_PER_PIXEL;
            frame[size] = frame[pixel];
            frame[size + 1] = frame[pixel + 1];
            frame[size + 2] = frame[pixel + 2];
            size += BYTES_PER_PIXEL;
        }
    }
    size
}

/// Copy one frame out of the mapped ring into the dump buffer, shrinking
/// when configured. Returns the byte count to send.
fn copy_video_frame(
    source: &[u8],
    dump_buffer: &mut [u8],
    screen_width: usize,
    screen_height: usize,
    is_shrink: bool,
    shrink_width: usize,
    shrink_height: usize,
) -> usize {
    let frame_size = screen_width * screen_height * BYTES_PER_PIXEL;
    if !is_shrink {
        dump_buffer[..frame_size].copy_from_slice(source);
        return frame_size;
    }

    if shrink_width < 4 || shrink_height < 4 {
        /*
         * A small shrink factor keeps most of the frame, and picking
         * pixels straight out of the uncached mapping is an order of
         * magnitude slower than one bulk copy. Copy the whole frame out
         * first and sub-sample the copy.
         */
        dump_buffer[..frame_size].copy_from_slice(source);
        shrink_frame_in_place(
            &mut dump_buffer[..frame_size],
            screen_width,
            screen_height,
            shrink_width,
            shrink_height,
        )
    } else {
        shrink_frame(
            source,
            dump_buffer,
            screen_width,
            screen_height,
            shrink_width,
            shrink_height,
        )
    }
}

impl Session {
    pub(super) fn process_dump_video_frame(&mut self) -> Result<()> {
        let outcome = self.dump_video_frames();
        self.clean_dump_state();
        outcome
    }

    fn dump_video_frames(&mut self) -> Result<()> {
        let request = DumpVideoFrameRequest::decode(&self.buffer);
        info!(
            "session {}: dump video frame, frames {}, memory1 0x{:x}, memory2 0x{:x}",
            self.id, request.number_of_frames, request.memory_address1, request.memory_address2
        );

        let frame_size =
            self.screen_width as usize * self.screen_height as usize * BYTES_PER_PIXEL;
        self.unit_aligned_size = page_aligned_size(frame_size);
        self.dump_addresses[0] = request.memory_address1;
        self.dump_addresses[1] = request.memory_address2;

        if request.number_of_frames == 0 {
            self.send_response(
                ErrorCode::Argument,
                ERROR_MESSAGE_FRAME_NUMBER_ZERO.as_bytes(),
            )?;
            return Ok(());
        }

        if !self.prepare_dump_buffer()? {
            return Ok(());
        }

        self.dump_limit = request.number_of_frames as u32;
        if !self.prepare_mmap()? {
            return Ok(());
        }

        self.send_response(ErrorCode::Ok, &[])?;

        let format = self.video_stream_format();
        debug!(
            "session {}: dump number of frames {}",
            self.id, request.number_of_frames
        );
        for frame_number in 0..request.number_of_frames as u32 {
            let offset = frame_number as usize * self.unit_aligned_size;
            self.dump_all_channel_video_frame(format, frame_number, offset)?;
        }
        Ok(())
    }

    pub(super) fn process_dump_realtime_video_frame(&mut self) -> Result<()> {
        let request = DumpRealtimeVideoRequest::decode(&self.buffer);
        info!(
            "session {}: dump realtime video, is_dual {}, mode {}",
            self.id, request.is_dual, request.mode
        );

        if self.reject_when_realtime()? {
            return Ok(());
        }

        let outcome = self.dump_realtime_video_stream(&request);
        self.clean_dump_state();
        outcome
    }

    fn dump_realtime_video_stream(&mut self, request: &DumpRealtimeVideoRequest) -> Result<()> {
        let mode = match self.check_realtime_mode(request.mode)? {
            Some(mode) => mode,
            None => return Ok(()),
        };

        if !self.realtime_video_parameters(request, mode)? {
            return Ok(());
        }
        if !self.prepare_dump_buffer()? {
            return Ok(());
        }
        if !self.prepare_mmap()? {
            return Ok(());
        }
        self.send_response(ErrorCode::Ok, &[])?;
        self.dump_realtime_video()
    }

    pub(super) fn process_dump_realtime_audio_page(&mut self) -> Result<()> {
        let request = DumpRealtimeAudioRequest::decode(&self.buffer);
        info!(
            "session {}: dump realtime audio, mode {}",
            self.id, request.mode
        );

        if self.reject_when_realtime()? {
            return Ok(());
        }

        let outcome = self.dump_realtime_audio_stream(&request);
        self.clean_dump_state();
        outcome
    }

    fn dump_realtime_audio_stream(&mut self, request: &DumpRealtimeAudioRequest) -> Result<()> {
        let mode = match self.check_realtime_mode(request.mode)? {
            Some(mode) => mode,
            None => return Ok(()),
        };
        self.is_dump_audio = true;

        if !self.realtime_audio_parameters(mode)? {
            return Ok(());
        }
        if !self.prepare_dump_buffer()? {
            return Ok(());
        }
        if !self.prepare_mmap()? {
            return Ok(());
        }
        self.send_response(ErrorCode::Ok, &[])?;
        self.dump_realtime_audio()
    }

    fn check_realtime_mode(&mut self, mode: u8) -> Result<Option<RealtimeMode>> {
        match RealtimeMode::from_request(mode) {
            Some(mode) => Ok(Some(mode)),
            None => {
                warn!(
                    "session {}: realtime mode {} is not acceptable",
                    self.id, mode
                );
                self.send_response(ErrorCode::Argument, ERROR_MESSAGE_REALTIME_MODE.as_bytes())?;
                Ok(None)
            }
        }
    }

    fn video_dimensions(&self, channel: usize) -> (u32, u32) {
        if self.board.video_crop_enable(channel) {
            let crop = self.board.video_crop(channel);
            (crop.width(), crop.height())
        } else {
            (
                self.board.video_frame_width(channel),
                self.board.video_frame_height(channel),
            )
        }
    }

    /// The dump region must hold the whole ring, or a wrong board config
    /// would run the copy loop off the end of the mapping.
    fn check_dump_memory(&mut self, index: usize, end_address: u32) -> Result<bool> {
        let minimum = self.unit_aligned_size as u64 * self.dump_limit as u64;
        info!(
            "session {}: realtime address[{}] = 0x{:x}, end address = 0x{:x}, \
             minimum memory space {} bytes",
            self.id, index, self.dump_addresses[index], end_address, minimum
        );
        if (end_address as u64).saturating_sub(self.dump_addresses[index] as u64) <= minimum {
            warn!(
                "session {}: {}",
                self.id, ERROR_MESSAGE_DUMP_MEMORY_NOT_ENOUGH
            );
            self.send_response(
                ErrorCode::Argument,
                ERROR_MESSAGE_DUMP_MEMORY_NOT_ENOUGH.as_bytes(),
            )?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Collect the realtime video parameters from the board and check the
    /// board state against the request. Reports false after an error
    /// response on any validation failure.
    fn realtime_video_parameters(
        &mut self,
        request: &DumpRealtimeVideoRequest,
        mode: RealtimeMode,
    ) -> Result<bool> {
        // Auto detect which dump controller is producing frames.
        let check_channel = if self.board.video_run(0) {
            0
        } else if self.board.video_run(1) {
            1
        } else {
            warn!("session {}: {}", self.id, ERROR_MESSAGE_NOT_RUN);
            self.send_response(ErrorCode::Argument, ERROR_MESSAGE_NOT_RUN.as_bytes())?;
            return Ok(false);
        };

        self.dump_addresses[0] = self.board.video_dump_start_address(check_channel);
        let (width, height) = self.video_dimensions(check_channel);

        self.dump_limit = self.board.video_dump_limit(check_channel);
        self.screen_width = width as u16;
        self.screen_height = height as u16;
        self.realtime_check_channel = check_channel;
        self.unit_aligned_size =
            page_aligned_size(width as usize * height as usize * BYTES_PER_PIXEL);
        self.realtime_mode = mode;

        if !self.check_dump_memory(0, self.board.video_dump_end_address(check_channel))? {
            return Ok(false);
        }

        if request.is_dual == 0 {
            // Second address of zero marks single channel dumping.
            self.dump_addresses[1] = 0;
        } else {
            let other_channel = 1 - check_channel;
            if !self.board.video_run(other_channel) {
                warn!("session {}: {}", self.id, ERROR_MESSAGE_2ND_CHANNEL_NOT_RUN);
                self.send_response(
                    ErrorCode::Argument,
                    ERROR_MESSAGE_2ND_CHANNEL_NOT_RUN.as_bytes(),
                )?;
                return Ok(false);
            }

            /*
             * Dual channel dumping only supports identical parameters on
             * both controllers.
             */
            let (other_width, other_height) = self.video_dimensions(other_channel);
            if other_width != width
                || other_height != height
                || self.dump_limit != self.board.video_dump_limit(other_channel)
            {
                warn!("session {}: {}", self.id, ERROR_MESSAGE_REALTIME_NON_SAME);
                self.send_response(
                    ErrorCode::Argument,
                    ERROR_MESSAGE_REALTIME_NON_SAME.as_bytes(),
                )?;
                return Ok(false);
            }

            self.dump_addresses[1] = self.board.video_dump_start_address(other_channel);
            if !self.check_dump_memory(1, self.board.video_dump_end_address(other_channel))? {
                return Ok(false);
            }
        }

        info!(
            "session {}: screen width {}, height {}, dump limit {}",
            self.id, self.screen_width, self.screen_height, self.dump_limit
        );
        Ok(true)
    }

    fn realtime_audio_parameters(&mut self, mode: RealtimeMode) -> Result<bool> {
        if !self.board.audio_run() {
            warn!("session {}: {}", self.id, ERROR_MESSAGE_NOT_RUN);
            self.send_response(ErrorCode::Argument, ERROR_MESSAGE_NOT_RUN.as_bytes())?;
            return Ok(false);
        }

        let start_address = self.board.audio_dump_start_address();
        let end_address = self.board.audio_dump_end_address();
        self.dump_addresses[0] = start_address;
        self.dump_addresses[1] = 0;
        /*
         * The audio dump controller has no dump limit register. The ring
         * capacity comes from the memory range itself.
         */
        self.dump_limit =
            (end_address.saturating_sub(start_address)) / AUDIO_PAGE_SIZE as u32;
        self.unit_aligned_size = AUDIO_PAGE_SIZE;
        self.realtime_mode = mode;

        info!(
            "session {}: realtime audio start_address = 0x{:x}, stop_address = 0x{:x}, limit {}",
            self.id, start_address, end_address, self.dump_limit
        );
        Ok(true)
    }

    fn video_stream_format(&self) -> VideoStreamFormat {
        let width = self.screen_width / (self.shrink_width as u16 + 1);
        let height = self.screen_height / (self.shrink_height as u16 + 1);
        let frame_size = width as usize * height as usize * BYTES_PER_PIXEL;
        info!(
            "session {}: start dump, screen ({}, {}), dump ({}, {}), dump length {}",
            self.id, self.screen_width, self.screen_height, width, height, frame_size
        );
        VideoStreamFormat {
            width,
            height,
            frame_size,
        }
    }

    /// Emit one frame index for every active channel, channel 0 first.
    /// Each frame is a header write followed by a pixel write.
    fn dump_all_channel_video_frame(
        &mut self,
        format: VideoStreamFormat,
        frame_number: u32,
        offset: usize,
    ) -> Result<()> {
        let screen_width = self.screen_width as usize;
        let screen_height = self.screen_height as usize;
        let frame_size = screen_width * screen_height * BYTES_PER_PIXEL;

        for channel in 0..MAX_VIDEO_DUMP_CHANNEL {
            let region = match self.mmap_sources[channel].as_ref() {
                Some(region) => region,
                None => continue,
            };
            let source = region.as_slice();
            if offset + frame_size > source.len() || frame_size > self.dump_buffer.len() {
                warn!(
                    "session {}: frame {}x{} does not fit the mapped ring, skipping channel {}",
                    self.id, screen_width, screen_height, channel
                );
                continue;
            }

            let mut packet = [0u8; PacketHead::SIZE + VideoDataStream::SIZE];
            let head = PacketHead::data(
                self.message_type,
                (VideoDataStream::SIZE + format.frame_size) as u32,
            );
            head.encode(&mut packet[..PacketHead::SIZE]);
            let data_head = VideoDataStream {
                frame_number,
                width: format.width,
                height: format.height,
                channel: channel as u8,
            };
            data_head.encode(&mut packet[PacketHead::SIZE..]);
            send_to_socket(&mut self.socket, self.id, &packet)?;

            let send_size = copy_video_frame(
                &source[offset..offset + frame_size],
                &mut self.dump_buffer,
                screen_width,
                screen_height,
                self.is_shrink,
                self.shrink_width as usize,
                self.shrink_height as usize,
            );
            send_to_socket(&mut self.socket, self.id, &self.dump_buffer[..send_size])?;
        }
        Ok(())
    }

    /// Decide what to do with the hardware counter reading. Overflow means
    /// the hardware lapped the reader and the slot behind `current_count`
    /// may be torn, so it is never copied.
    fn next_dump_count(&mut self, current_count: u32, hw_count: u32) -> Result<DumpStep> {
        let difference = count_difference(hw_count, current_count);
        if difference == 0 {
            return Ok(DumpStep::NoProgress);
        }
        if difference <= self.dump_limit {
            return Ok(DumpStep::Advance(current_count + 1));
        }

        match self.realtime_mode {
            RealtimeMode::StopWhenOverflow => {
                warn!("session {}: {}", self.id, ERROR_MESSAGE_MEMORY_OVERFLOW);
                let error_code = if self.is_dump_audio {
                    ErrorCode::AudioMemoryOverflowStop
                } else {
                    ErrorCode::VideoMemoryOverflowStop
                };
                self.send_response(error_code, ERROR_MESSAGE_MEMORY_OVERFLOW.as_bytes())?;
                Ok(DumpStep::Stop)
            }
            RealtimeMode::BestEffort => {
                let message = if self.is_dump_audio {
                    format!("Drop realtime audio page {}", difference)
                } else {
                    format!("Drop realtime video frame {}", difference)
                };
                warn!("session {}: {}", self.id, message);
                let error_code = if self.is_dump_audio {
                    ErrorCode::AudioMemoryOverflowDrop
                } else {
                    ErrorCode::VideoMemoryOverflowDrop
                };
                self.send_response(error_code, message.as_bytes())?;
                Ok(DumpStep::Skip(current_count + difference))
            }
            RealtimeMode::NonRealtime => Err(Error::RealtimeState),
        }
    }

    /// Realtime video loop. Polls the socket without blocking, honors the
    /// stop flag, then chases the hardware frame counter. The counter is
    /// the time source, so the loop spins instead of waiting on the
    /// socket.
    fn dump_realtime_video(&mut self) -> Result<()> {
        let mut format = self.video_stream_format();
        let mut frame_number: u32 = 0;

        loop {
            if self.poll_socket()? {
                self.process_message()?;
                if !self.stop_dump {
                    /*
                     * The interleaved request may have changed the shrink
                     * configuration, so refresh the cached data header.
                     */
                    format = self.video_stream_format();
                }
            }

            if self.stop_dump {
                self.stop_dump = false;
                return Ok(());
            }

            /*
             * Both channels produce frames in step, polling one counter is
             * enough.
             */
            let hw_count = self.board.video_frame_count(self.realtime_check_channel);
            match self.next_dump_count(frame_number, hw_count)? {
                DumpStep::NoProgress => continue,
                DumpStep::Stop => return Ok(()),
                DumpStep::Skip(next) => {
                    frame_number = next;
                }
                DumpStep::Advance(next) => {
                    let offset =
                        (frame_number % self.dump_limit) as usize * self.unit_aligned_size;
                    self.dump_all_channel_video_frame(format, frame_number, offset)?;
                    frame_number = next;
                }
            }
        }
    }

    /// Realtime audio loop, same shape as the video loop over 4 KiB
    /// pages.
    fn dump_realtime_audio(&mut self) -> Result<()> {
        let mut page_count: u32 = 0;

        loop {
            if self.poll_socket()? {
                /*
                 * Keep the streaming packets tagged with the dump request
                 * type across an interleaved request.
                 */
                let message_type = self.message_type;
                self.process_message()?;
                self.message_type = message_type;
            }

            if self.stop_dump {
                self.stop_dump = false;
                return Ok(());
            }

            let hw_count = self.board.audio_page_count();
            match self.next_dump_count(page_count, hw_count)? {
                DumpStep::NoProgress => continue,
                DumpStep::Stop => return Ok(()),
                DumpStep::Skip(next) => {
                    page_count = next;
                }
                DumpStep::Advance(next) => {
                    self.send_audio_page(page_count)?;
                    page_count = next;
                }
            }
        }
    }

    fn send_audio_page(&mut self, page_count: u32) -> Result<()> {
        let region = match self.mmap_sources[0].as_ref() {
            Some(region) => region,
            None => return Ok(()),
        };
        let offset = (page_count % self.dump_limit) as usize * AUDIO_PAGE_SIZE;
        let source = region.as_slice();
        if offset + AUDIO_PAGE_SIZE > source.len() || AUDIO_PAGE_SIZE > self.dump_buffer.len() {
            return Ok(());
        }

        let mut packet = [0u8; PacketHead::SIZE + AudioDataStream::SIZE];
        let head = PacketHead::data(
            self.message_type,
            (AudioDataStream::SIZE + AUDIO_PAGE_SIZE) as u32,
        );
        head.encode(&mut packet[..PacketHead::SIZE]);
        AudioDataStream { page_count }.encode(&mut packet[PacketHead::SIZE..]);
        send_to_socket(&mut self.socket, self.id, &packet)?;

        self.dump_buffer[..AUDIO_PAGE_SIZE]
            .copy_from_slice(&source[offset..offset + AUDIO_PAGE_SIZE]);
        send_to_socket(&mut self.socket, self.id, &self.dump_buffer[..AUDIO_PAGE_SIZE])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_difference_follows_hardware() {
        assert_eq!(count_difference(5, 5), 0);
        assert_eq!(count_difference(7, 4), 3);
    }

    #[test]
    fn count_difference_wraps_at_sixteen_bits() {
        assert_eq!(count_difference(5, 0x1FFFB), 10);
        assert_eq!(count_difference(0, 0xFFFF), 1);
    }

    #[test]
    fn page_aligned_size_rounds_up() {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize };
        assert_eq!(page_aligned_size(0), 0);
        assert_eq!(page_aligned_size(1), page_size);
        assert_eq!(page_aligned_size(page_size), page_size);
        assert_eq!(page_aligned_size(page_size + 1), 2 * page_size);
    }

    fn test_frame(width: usize, height: usize) -> Vec<u8> {
        (0..width * height * BYTES_PER_PIXEL)
            .map(|i| i as u8)
            .collect()
    }

    #[test]
    fn shrink_emits_one_pixel_per_step() {
        // 4x4 frame, shrink (1, 1) keeps pixels (0, 0), (0, 2), (2, 0), (2, 2)
        let source = test_frame(4, 4);
        let mut dest = vec![0u8; source.len()];
        let size = shrink_frame(&source, &mut dest, 4, 4, 1, 1);
        assert_eq!(size, 2 * 2 * BYTES_PER_PIXEL);
        let expected: Vec<u8> = [0usize, 6, 24, 30]
            .iter()
            .flat_map(|&pixel| source[pixel..pixel + 3].to_vec())
            .collect();
        assert_eq!(&dest[..size], expected.as_slice());
    }

    #[test]
    fn shrink_in_place_matches_two_buffer_shrink() {
        let source = test_frame(8, 8);
        let mut dest = vec![0u8; source.len()];
        let size = shrink_frame(&source, &mut dest, 8, 8, 3, 1);

        let mut frame = source.clone();
        let in_place_size = shrink_frame_in_place(&mut frame, 8, 8, 3, 1);

        assert_eq!(size, in_place_size);
        assert_eq!(&dest[..size], &frame[..size]);
    }

    #[test]
    fn shrink_dimension_law() {
        // emitted width = screen / (shrink + 1), same for height
        let source = test_frame(17, 9);
        let mut dest = vec![0u8; source.len()];
        let size = shrink_frame(&source, &mut dest, 17, 9, 4, 2);
        assert_eq!(size, (17 / 5) * (9 / 3) * BYTES_PER_PIXEL);
    }

    #[test]
    fn copy_video_frame_without_shrink_is_bulk_copy() {
        let source = test_frame(4, 2);
        let mut dest = vec![0u8; source.len()];
        let size = copy_video_frame(&source, &mut dest, 4, 2, false, 0, 0);
        assert_eq!(size, source.len());
        assert_eq!(dest, source);
    }

    #[test]
    fn copy_video_frame_picks_shrink_paths() {
        let source = test_frame(8, 8);
        // Small factors go through the copy-first path, large factors
        // sub-sample the source directly. Output must not differ.
        let mut small = vec![0u8; source.len()];
        let small_size = copy_video_frame(&source, &mut small, 8, 8, true, 1, 1);
        let mut direct = vec![0u8; source.len()];
        let direct_size = shrink_frame(&source, &mut direct, 8, 8, 1, 1);
        assert_eq!(small_size, direct_size);
        assert_eq!(&small[..small_size], &direct[..direct_size]);

        let mut large = vec![0u8; source.len()];
        let large_size = copy_video_frame(&source, &mut large, 8, 8, true, 7, 7);
        assert_eq!(large_size, BYTES_PER_PIXEL);
        assert_eq!(&large[..3], &source[..3]);
    }
}
