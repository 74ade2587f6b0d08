//! # Item and Category Commands

use tracing::info;

use tsk_core::{Category, Item};
use tsk_db::{ItemUpdate, NewItem};

use super::{cell, CommandResult, Context};
use crate::cli::{CategoryCommand, ItemCommand};

pub async fn run(ctx: &Context, cmd: ItemCommand) -> CommandResult {
    match cmd {
        ItemCommand::Add {
            name,
            price,
            gst,
            stock,
            barcode,
            hsn,
            category,
            staff,
        } => {
            let staff_id = match staff {
                Some(key) => Some(ctx.staff(&key).await?.id),
                None => None,
            };
            let item = ctx
                .db
                .items()
                .insert(
                    NewItem {
                        barcode,
                        name,
                        hsn_code: hsn,
                        category,
                        price,
                        gst_rate: gst,
                        stock_quantity: stock,
                    },
                    staff_id.as_deref(),
                )
                .await?;
            info!(id = %item.id, name = %item.name, "Item added");
            ctx.emit(&item, || format!("Added {}\n{}", item.id, table(std::slice::from_ref(&item))))
        }
        ItemCommand::List { all } => {
            let items = ctx.db.items().list(all).await?;
            ctx.emit(&items, || table(&items))
        }
        ItemCommand::Search { query, limit } => {
            let items = ctx.db.items().search(&query, limit).await?;
            ctx.emit(&items, || table(&items))
        }
        ItemCommand::Show { item } => {
            let item = ctx.item(&item).await?;
            ctx.emit(&item, || detail(&item))
        }
        ItemCommand::Update {
            item,
            name,
            price,
            gst,
            barcode,
            hsn,
            category,
        } => {
            let current = ctx.item(&item).await?;
            let update = ItemUpdate {
                barcode: barcode.or(current.barcode),
                name: name.unwrap_or(current.name),
                hsn_code: hsn.or(current.hsn_code),
                category: category.or(current.category),
                price: price.unwrap_or(current.price),
                gst_rate: gst.unwrap_or(current.gst_rate),
            };
            let updated = ctx.db.items().update_details(&current.id, update).await?;
            ctx.emit(&updated, || detail(&updated))
        }
        ItemCommand::Deactivate { item } => {
            let item = ctx.item(&item).await?;
            ctx.db.items().deactivate(&item.id).await?;
            ctx.emit(&item.id, || format!("Deactivated {}", item.name))
        }
        ItemCommand::Delete { item } => {
            let item = ctx.item(&item).await?;
            ctx.db.items().delete(&item.id).await?;
            ctx.emit(&item.id, || format!("Deleted {}", item.name))
        }
    }
}

pub async fn categories(ctx: &Context, cmd: CategoryCommand) -> CommandResult {
    let categories = ctx.db.categories();

    match cmd {
        CategoryCommand::Add { name } => {
            let category = categories.add(&name).await?;
            ctx.emit(&category, || format!("Added category {}", category.name))
        }
        CategoryCommand::List => {
            let all = categories.list().await?;
            ctx.emit(&all, || category_table(&all))
        }
    }
}

fn category_table(categories: &[Category]) -> String {
    let mut out = format!("{} {:>6}", cell("CATEGORY", 24), "ITEMS");
    for category in categories {
        out.push_str(&format!("\n{} {:>6}", cell(&category.name, 24), category.item_count));
    }
    out
}

fn table(items: &[Item]) -> String {
    let mut out = format!(
        "{} {} {} {:>12} {:>6} {:>6}",
        cell("BARCODE", 16),
        cell("NAME", 32),
        cell("CATEGORY", 12),
        "PRICE",
        "GST",
        "STOCK"
    );
    for item in items {
        out.push('\n');
        out.push_str(&format!(
            "{} {} {} {:>12} {:>6} {:>6}{}",
            cell(item.barcode.as_deref().unwrap_or("-"), 16),
            cell(&item.name, 32),
            cell(item.category.as_deref().unwrap_or("-"), 12),
            item.price.to_string(),
            item.gst_rate.to_string(),
            item.stock_quantity,
            if item.is_active { "" } else { "  (inactive)" }
        ));
    }
    out
}

fn detail(item: &Item) -> String {
    format!(
        "{}\n  id        {}\n  barcode   {}\n  hsn       {}\n  category  {}\n  price     {}\n  gst       {}\n  stock     {}\n  active    {}",
        item.name,
        item.id,
        item.barcode.as_deref().unwrap_or("-"),
        item.hsn_code.as_deref().unwrap_or("-"),
        item.category.as_deref().unwrap_or("-"),
        item.price,
        item.gst_rate,
        item.stock_quantity,
        item.is_active
    )
}
