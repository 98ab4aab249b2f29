use crate::slug::slugify;
use crate::utils::ProcessResult;
use eyre::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONVERSATION_FILE: &str = "conversation.md";
pub const ATTACHMENTS_DIR: &str = "attachments";
/// Stable-id characters appended to a folder name that is already taken.
pub const COLLISION_SUFFIX_LEN: usize = 8;

/// Where one conversation lands, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPlan {
    pub root: PathBuf,
    /// `[project-slug/]{stamp}_{title-slug}[_{stable-id-prefix}]`
    pub relative: PathBuf,
    pub collided: bool,
}

impl FolderPlan {
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.relative)
    }

    pub fn file(&self) -> PathBuf {
        self.dir().join(CONVERSATION_FILE)
    }

    pub fn relative_file(&self) -> PathBuf {
        self.relative.join(CONVERSATION_FILE)
    }
}

/// Pick the folder for a conversation.
///
/// Conversations with a project key are nested one level under the
/// slugified key. When the primary name already exists on disk the first
/// characters of the stable id are appended; a second collision is not
/// checked.
pub fn plan_folder(
    output_root: &Path,
    project: Option<&str>,
    stamp: &str,
    title_slug: &str,
    stable_id: &str,
) -> FolderPlan {
    let parent = project.map(slugify).map(PathBuf::from).unwrap_or_default();
    let primary = format!("{}_{}", stamp, title_slug);

    let collided = output_root.join(&parent).join(&primary).exists();
    let name = if collided {
        let suffix = &stable_id[..COLLISION_SUFFIX_LEN.min(stable_id.len())];
        format!("{}_{}", primary, suffix)
    } else {
        primary
    };

    FolderPlan {
        root: output_root.to_path_buf(),
        relative: parent.join(name),
        collided,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub dry_run: bool,
    pub copy_attachments: bool,
    /// Whether any attachment payload was resolved. Never true for current exports.
    pub has_present_attachments: bool,
}

/// Write `contents` as the conversation file of `plan`, or in dry-run mode
/// only report the path. Dry runs never touch the filesystem.
pub fn write_folder(plan: &FolderPlan, contents: &[u8], options: WriteOptions) -> Result<ProcessResult> {
    if options.dry_run {
        println!("[DRY-RUN] Would write: {}", plan.relative_file().display());
        return Ok(ProcessResult::Planned);
    }

    let dir = plan.dir();
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("Failed to create folder: {}", dir.display()))?;

    if options.copy_attachments && options.has_present_attachments {
        let attachments_dir = dir.join(ATTACHMENTS_DIR);
        fs::create_dir_all(&attachments_dir).wrap_err_with(|| {
            format!(
                "Failed to create attachments folder: {}",
                attachments_dir.display()
            )
        })?;
    }

    let path = plan.file();
    let file =
        File::create(&path).wrap_err_with(|| format!("Failed to create: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents)
        .wrap_err_with(|| format!("Failed to write: {}", path.display()))?;
    writer.flush().wrap_err("Failed to flush markdown file")?;

    debug!(path = %path.display(), "wrote conversation");
    Ok(ProcessResult::Written)
}
