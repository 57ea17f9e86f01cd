/// Failure kinds kept distinguishable inside the crate; the surrounding
/// kernel collapses them to its single failure sentinel at the syscall
/// boundary. End-of-stream is not an error and is signalled as a zero
/// count or `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsError {
    /// No dentry with the requested name or index.
    NotFound,
    /// Dentry type field outside the known set.
    InvalidType,
    /// Empty name, or name longer than the fixed field.
    InvalidName,
    /// Operation not available for this file kind.
    Unsupported,
    /// No free dentry slot, inode, or data block left, or the
    /// direct-block-list capacity would be exceeded.
    Exhausted,
    /// Inode or data-block index outside the volume's capacity.
    OutOfRange,
    /// Image geometry inconsistent with the memory it was mounted from.
    BadImage,
}

pub type FsResult<T> = Result<T, FsError>;
