//! Effects - side effects declared by the reducer

/// Side effects that can be triggered by actions
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch the known-name universe
    LoadNames,
    /// Read persisted history; the snapshot comes back tagged `generation`
    LoadHistory { generation: u64 },
    /// Persist a query, then reload history tagged `generation`
    RecordHistory { query: String, generation: u64 },
    /// Resolve detail for the query-string-of-record
    FetchDetail { query: String },
    /// Fetch and decode artwork
    LoadSprite { url: String },
    /// (Re)start the debounce timer that syncs typed text to the record
    ScheduleQuerySync { generation: u64 },
    /// Drop a pending debounce timer
    CancelQuerySync,
    /// Start the blur grace timer
    ScheduleBlurClose { token: u64 },
    /// Drop a pending blur grace timer
    CancelBlurClose,
    /// Start the "limit reached" notice timer
    ScheduleNoticeClear { generation: u64 },
}
