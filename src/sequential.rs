use crate::importer::{AttachmentStub, Conversation};
use crate::loader::{self, SharedIndex};
use crate::ordering::{collect_messages, order_messages};
use crate::renderer::{self, ConversationMeta};
use crate::slug::{filename_stamp, slugify};
use crate::utils::{ExportConfig, ProcessResult, epoch_to_iso, stable_id};
use crate::writer::{FolderPlan, WriteOptions, plan_folder, write_folder};
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use tracing::{debug, info};

/// Read-only state shared by every conversation of one run.
pub struct ExportContext<'a> {
    pub config: &'a ExportConfig,
    pub source_label: &'static str,
    pub owner_email: Option<String>,
    pub shared_index: SharedIndex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub written: usize,
    pub planned: usize,
    pub source_label: String,
}

/// The main entry point for the export logic.
///
/// Conversations are converted strictly one at a time in input order. The
/// first failure aborts the run; folders already written stay on disk.
pub fn execute(config: &ExportConfig) -> Result<RunSummary> {
    let export = loader::load_export(&config.input_dir, config.prefer)?;
    let ctx = ExportContext {
        config,
        source_label: export.source_label(),
        owner_email: loader::load_owner_email(&config.input_dir),
        shared_index: loader::load_shared_index(&config.input_dir),
    };
    info!(
        source = ctx.source_label,
        conversations = export.conversations.len(),
        owner_known = ctx.owner_email.is_some(),
        shared_entries = ctx.shared_index.len(),
        "export loaded"
    );

    if !config.dry_run {
        fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;
    }

    let pb = progress_bar(config, export.conversations.len() as u64);
    let mut summary = RunSummary {
        source_label: ctx.source_label.to_string(),
        ..RunSummary::default()
    };

    for (idx, conversation) in export.conversations.iter().enumerate() {
        let (plan, result) = export_conversation(conversation, idx + 1, &ctx)
            .wrap_err_with(|| format!("Failed to export conversation #{}", idx + 1))?;
        debug!(folder = %plan.relative.display(), collided = plan.collided, "conversation done");
        match result {
            ProcessResult::Written => summary.written += 1,
            ProcessResult::Planned => summary.planned += 1,
        }
        summary.processed += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();

    if !config.quiet {
        println!(
            "Processed {} conversation(s) from {}.",
            summary.processed, summary.source_label
        );
        println!("Output root: {}", config.output_dir.display());
        if config.dry_run {
            println!("No files were written (dry run).");
        }
    }

    Ok(summary)
}

/// Convert one conversation and write (or plan) its folder.
/// `position` is 1-based and only feeds the fallback title.
pub fn export_conversation(
    conversation: &Conversation,
    position: usize,
    ctx: &ExportContext<'_>,
) -> Result<(FolderPlan, ProcessResult)> {
    let config = ctx.config;
    let title = conversation.display_title(position);
    let ordered = order_messages(conversation, config.include_tools);

    let created_at = epoch_to_iso(conversation.create_time);
    let updated_at = match conversation.update_time {
        Some(ts) => epoch_to_iso(Some(ts)),
        None => epoch_to_iso(
            ordered
                .messages
                .iter()
                .filter_map(|m| m.create_time)
                .reduce(f64::max),
        ),
    };

    let stable_id = stable_id(conversation);
    let project = conversation.project_key();
    let plan = plan_folder(
        &config.output_dir,
        project.as_deref(),
        &filename_stamp(created_at.as_deref()),
        &slugify(&title),
        &stable_id,
    );

    // Stubs come from every message, hidden and tool ones included.
    let attachments: Vec<AttachmentStub> = collect_messages(conversation)
        .into_iter()
        .flat_map(|m| m.attachments())
        .map(AttachmentStub::from)
        .collect();
    let has_present_attachments = attachments.iter().any(|a| a.present);

    let meta = ConversationMeta {
        title,
        created_at,
        updated_at,
        stable_id,
        source: ctx.source_label.to_string(),
        participants: ordered.participants.clone(),
        project,
        shared: ctx.shared_index.lookup(conversation.id.as_deref()),
        owner_email: ctx.owner_email.clone(),
        attachments,
    };

    let mut contents = Vec::new();
    renderer::render_conversation(&mut contents, &meta, &ordered.messages)
        .wrap_err("Failed to render markdown")?;

    let options = WriteOptions {
        dry_run: config.dry_run,
        copy_attachments: config.copy_attachments,
        has_present_attachments,
    };
    let result = write_folder(&plan, &contents, options)?;
    Ok((plan, result))
}

fn progress_bar(config: &ExportConfig, total: u64) -> ProgressBar {
    if config.quiet || config.verbose || config.dry_run {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}
