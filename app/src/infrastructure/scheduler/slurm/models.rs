use serde::Deserialize;

/// One `sacct -PX` allocation row. Memory fields are empty for allocation
/// rows that never ran a step.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct SacctRow {
    #[serde(rename = "JobID")]
    pub job_id: String,
    #[serde(rename = "JobName")]
    pub job_name: String,
    #[serde(rename = "User")]
    pub user: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "ExitCode")]
    pub exit_code: String,
    #[serde(rename = "WorkDir")]
    pub work_dir: String,
    #[serde(rename = "CPUTimeRAW")]
    pub cpu_time: u64,
    #[serde(rename = "ElapsedRaw")]
    pub elapsed: u64,
    #[serde(rename = "NCPUS")]
    pub ncpus: u64,
    #[serde(rename = "AveRSS")]
    pub avg_mem: Option<u64>,
    #[serde(rename = "MaxRSS")]
    pub max_mem: Option<u64>,
    #[serde(rename = "NNodes")]
    pub nnodes: u64,
    #[serde(rename = "Start")]
    pub start: String,
    #[serde(rename = "End")]
    pub end: String,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn deserialize() {
        let out = indoc! {r#"
            JobID|JobName|User|State|ExitCode|WorkDir|CPUTimeRAW|ElapsedRaw|NCPUS|AveRSS|MaxRSS|NNodes|Start|End
            431|dl_lstm_pytorch_DB|student|COMPLETED|0:0|/home/student|129600|43200|3|||1|2019-11-09T10:00:00|2019-11-09T22:00:00
            "#
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .quoting(false)
            .from_reader(out.as_bytes());
        let row: SacctRow = reader.deserialize().next().unwrap().unwrap();

        assert_eq!(row.job_id, "431");
        assert_eq!(row.state, "COMPLETED");
        assert_eq!(row.ncpus, 3);
        assert_eq!(row.avg_mem, None);
    }
}
