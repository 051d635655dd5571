use outreach_common::ShardKey;

/// Stats from a generation run.
#[derive(Debug, Default)]
pub struct GenerationStats {
    pub shards_planned: u32,
    pub shards_skipped: u32,
    pub shards_written: u32,
    pub shards_failed: u32,
    pub collaborator_calls: u32,
    pub records_received: u32,
    pub records_written: u32,
    pub duplicates_suppressed: u32,
    pub failed: Vec<ShardKey>,
}

impl std::fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Generation Complete ===")?;
        writeln!(f, "Shards planned:     {}", self.shards_planned)?;
        writeln!(f, "Shards skipped:     {}", self.shards_skipped)?;
        writeln!(f, "Shards written:     {}", self.shards_written)?;
        writeln!(f, "Shards failed:      {}", self.shards_failed)?;
        writeln!(f, "Model calls:        {}", self.collaborator_calls)?;
        writeln!(f, "Records received:   {}", self.records_received)?;
        writeln!(f, "Records written:    {}", self.records_written)?;
        write!(f, "Duplicates dropped: {}", self.duplicates_suppressed)?;
        if !self.failed.is_empty() {
            write!(f, "\n\nNot generated (rerun to retry):")?;
            for key in &self.failed {
                write!(f, "\n  {key}")?;
            }
        }
        Ok(())
    }
}

/// Stats from a merge.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub shards_read: u32,
    pub shards_unreadable: u32,
    pub records_read: u32,
    pub duplicates: u32,
    pub records_written: u32,
}

impl std::fmt::Display for MergeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Merge: {} shards read ({} unreadable), {} records read, {} duplicates dropped, {} unique written",
            self.shards_read,
            self.shards_unreadable,
            self.records_read,
            self.duplicates,
            self.records_written,
        )
    }
}
