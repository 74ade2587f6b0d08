//! # Settings, Backup and Status Commands

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::PathBuf;

use tsk_db::migrations;

use super::{cell, CommandResult, Context};
use crate::cli::{BackupArgs, SettingsCommand};
use crate::error::AppError;

const BACKUP_HISTORY_LIMIT: u32 = 20;

pub async fn run(ctx: &Context, cmd: SettingsCommand) -> CommandResult {
    let settings = ctx.db.settings();

    match cmd {
        SettingsCommand::Get { key } => {
            let value = settings
                .get(&key)
                .await?
                .ok_or_else(|| AppError::not_found("Setting", &key))?;
            ctx.emit(&value, || value.clone())
        }
        SettingsCommand::Set { key, value } => {
            settings.set(&key, &value).await?;
            let stored = settings.get(&key).await?.unwrap_or_default();
            ctx.emit(&stored, || format!("{} = {}", key, stored))
        }
        SettingsCommand::List => {
            let all = settings.all().await?;
            ctx.emit(&all, || {
                all.iter()
                    .map(|(key, value)| format!("{} {}", cell(key, 24), value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

pub async fn backup(ctx: &Context, args: BackupArgs) -> CommandResult {
    if args.history {
        let records = ctx.db.backup_history(BACKUP_HISTORY_LIMIT).await?;
        return ctx.emit(&records, || {
            if records.is_empty() {
                return "No backups yet".to_string();
            }
            records
                .iter()
                .map(|r| format!("{}  {}", r.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"), r.path))
                .collect::<Vec<_>>()
                .join("\n")
        });
    }

    let target = match args.path {
        Some(path) => path,
        None => ctx.config.backup_dir()?.join(backup_file_name(Utc::now())),
    };
    let record = ctx.db.backup_to(&target).await?;
    ctx.emit(&record, || format!("Backed up to {}", record.path))
}

#[derive(Debug, Serialize)]
struct Status {
    store_name: String,
    database_path: String,
    healthy: bool,
    migrations_applied: usize,
    migrations_total: usize,
    active_items: i64,
    next_invoice_number: String,
}

pub async fn status(ctx: &Context) -> CommandResult {
    let (migrations_total, migrations_applied) = migrations::migration_status(ctx.db.pool()).await?;
    let sequencer = ctx.db.sequencer();
    let prefix = sequencer.prefix().await?;

    let status = Status {
        store_name: ctx.config.store_name.clone(),
        database_path: ctx.config.database_path()?.display().to_string(),
        healthy: ctx.db.health_check().await,
        migrations_applied,
        migrations_total,
        active_items: ctx.db.items().count().await?,
        next_invoice_number: sequencer.next_invoice_number(&prefix).await?,
    };

    ctx.emit(&status, || {
        format!(
            "{}\n  database      {}\n  healthy       {}\n  migrations    {}/{}\n  active items  {}\n  next invoice  {}",
            status.store_name,
            status.database_path,
            status.healthy,
            status.migrations_applied,
            status.migrations_total,
            status.active_items,
            status.next_invoice_number
        )
    })
}

/// `tsk-YYYYMMDD-HHMMSS.db` in local time.
fn backup_file_name(at: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("tsk-{}.db", at.with_timezone(&Local).format("%Y%m%d-%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_file_name_shape() {
        let name = backup_file_name(Utc::now());
        let name = name.to_string_lossy();

        assert!(name.starts_with("tsk-"));
        assert!(name.ends_with(".db"));
        assert_eq!(name.len(), "tsk-20261017-093000.db".len());
    }
}
