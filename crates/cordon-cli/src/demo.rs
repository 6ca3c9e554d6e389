//! End-to-end revocation walkthrough

use crate::state::AppState;
use anyhow::{bail, Context};
use cordon_core::{AccessError, GroupId, GroupMember, GroupOwner, Principal};
use std::path::{Path, PathBuf};
use tracing::info;

const SAMPLE_NAME: &str = "sample.txt";
const SAMPLE_CONTENTS: &[u8] = b"Quarterly numbers, shared with the group until someone leaves.\n";

/// What a successful walkthrough observed
#[derive(Debug)]
pub struct DemoOutcome {
    pub group: GroupId,
    /// Error the removed member got for its old transaction
    pub stale_download_error: String,
    pub rekeyed_files: usize,
    /// Owner's decrypted copy of the re-keyed file
    pub saved_to: PathBuf,
}

/// Run the owner/member scenario.
///
/// An owner creates a group and admits a member, the member uploads `input`
/// (or a generated sample), and the owner then removes the member and secures
/// the group's files. The member's old transaction must fail to decrypt while
/// the owner still reads the re-keyed file. Any other outcome is an error.
pub async fn run_demo(state: &AppState, input: Option<&Path>) -> anyhow::Result<DemoOutcome> {
    let operator = &state.operator;
    let output_dir = &state.config.output_dir;
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let input = match input {
        Some(path) => path.to_path_buf(),
        None => {
            let path = output_dir.join(SAMPLE_NAME);
            tokio::fs::write(&path, SAMPLE_CONTENTS).await?;
            path
        }
    };
    let original = tokio::fs::read(&input)
        .await
        .with_context(|| format!("reading {}", input.display()))?;

    let owner = GroupOwner::new(operator.key_provider())?;
    let member = GroupMember::new(operator.key_provider())?;
    info!(owner = %owner.id(), member = %member.id(), "Principals onboarded");

    let group = owner.create_group(operator)?;
    owner.add_member_object(operator, &group, &member).await?;

    let receipt = member.upload(operator, &owner, &group, &input).await?;
    info!(transaction = %receipt.transaction_id, handle = %receipt.handle, "Member uploaded file");

    let report = owner
        .remove_member_and_secure_files(operator, &group, member.id())
        .await?;
    if !report.is_complete() {
        bail!("{} file(s) could not be re-keyed", report.failures.len());
    }

    let stale_download_error = match member
        .download(operator, &group, receipt.transaction_id.as_str())
        .await
    {
        Err(e @ AccessError::DecryptionError(_)) => e.to_string(),
        Err(e) => bail!("removed member failed with an unexpected error: {e}"),
        Ok(_) => bail!("removed member could still download the file"),
    };
    info!(error = %stale_download_error, "Removed member locked out");

    let files = owner.list_files(&group)?;
    let Some(file) = files.first() else {
        bail!("group has no files after re-keying");
    };
    let downloaded = owner
        .download(operator, &group, file.transaction_id.as_str())
        .await?;
    if downloaded.plaintext != original {
        bail!("owner's re-keyed copy does not match the original");
    }
    let saved_to = downloaded.save_to(output_dir).await?;
    info!(path = %saved_to.display(), "Owner recovered the re-keyed file");

    Ok(DemoOutcome {
        group,
        stale_download_error,
        rekeyed_files: report.rekeyed.len(),
        saved_to,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CordonConfig;

    fn config(dir: &Path) -> CordonConfig {
        CordonConfig {
            use_memory_store: true,
            key_bits: 1024,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_demo_with_generated_sample() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(config(dir.path())).await.unwrap();

        let outcome = run_demo(&state, None).await.unwrap();

        assert_eq!(outcome.rekeyed_files, 1);
        assert!(outcome.stale_download_error.contains("decryption failed"));
        assert_eq!(std::fs::read(&outcome.saved_to).unwrap(), SAMPLE_CONTENTS);
        assert!(dir.path().join(SAMPLE_NAME).exists());
    }

    #[tokio::test]
    async fn test_demo_with_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.csv");
        std::fs::write(&input, b"a,b,c\n1,2,3\n").unwrap();
        let state = AppState::new(config(&dir.path().join("out"))).await.unwrap();

        let outcome = run_demo(&state, Some(&input)).await.unwrap();
        assert!(outcome
            .saved_to
            .to_string_lossy()
            .ends_with("-decrypted.csv"));
    }

    #[tokio::test]
    async fn test_demo_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(config(dir.path())).await.unwrap();
        assert!(run_demo(&state, Some(Path::new("/no/such/input.txt"))).await.is_err());
    }
}
