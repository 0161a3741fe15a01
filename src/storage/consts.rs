/// Size in bytes of a disk page.
pub const PAGE_SIZE: usize = 4096;

/// On-disk size in bytes of a string value. Shorter strings are
/// zero-padded; the logical length of a string never exceeds this.
pub const STRING_LEN: usize = 32;

/// Size of the page header: `i32 num_slots` followed by `i32 used_count`.
pub const PAGE_HEADER_SIZE: usize = 8;
