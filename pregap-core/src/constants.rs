pub const FRAMES_PER_SECOND: u16 = 75;
pub const FRAMES_PER_MINUTE: u16 = FRAMES_PER_SECOND * 60;

/// Offset in sectors between LBA 0 and LSN 0 (2 seconds of pregap lead-in).
pub const PREGAP_OFFSET: u16 = FRAMES_PER_SECOND * 2;

/// Raw CD-DA audio payload size, in bytes, per sector.
pub const AUDIO_FRAME_SIZE: usize = 2352;

/// Formatted Q sub-channel response size, in bytes, per sector (MMC-3 Table 38).
pub const SUBQ_FRAME_SIZE: usize = 16;

/// Size of one raw audio+Q-subchannel frame as returned by `SectorTransport`.
pub const RAW_AND_SUBQ_FRAME_SIZE: usize = AUDIO_FRAME_SIZE + SUBQ_FRAME_SIZE;

/// Step size, in sectors, used by the coarse backtrack stage of the pregap finder.
pub const COARSE_BACKTRACK_STEP: u32 = PREGAP_OFFSET as u32;

/// Normal retry ceiling: cheap attempts for sectors the algorithm can route around.
pub const DEFAULT_NORMAL_RETRIES: u32 = 5;

/// Hard retry ceiling: expensive attempts for sectors essential to narrowing the bounds.
pub const DEFAULT_HARD_RETRIES: u32 = 200;
