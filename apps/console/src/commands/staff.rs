//! # Staff and Customer Commands

use tsk_core::{Customer, Staff};

use super::{cell, CommandResult, Context};
use crate::cli::{CustomerCommand, StaffCommand};

pub async fn run(ctx: &Context, cmd: StaffCommand) -> CommandResult {
    match cmd {
        StaffCommand::Add { name } => {
            let staff = ctx.db.staff().insert(&name).await?;
            ctx.emit(&staff, || format!("Added {} ({})", staff.name, staff.id))
        }
        StaffCommand::List { all } => {
            let staff = ctx.db.staff().list(all).await?;
            ctx.emit(&staff, || table(&staff))
        }
        StaffCommand::Deactivate { staff } => {
            let staff = ctx.staff(&staff).await?;
            ctx.db.staff().deactivate(&staff.id).await?;
            ctx.emit(&staff.id, || format!("Deactivated {}", staff.name))
        }
    }
}

fn table(staff: &[Staff]) -> String {
    let mut out = format!("{} {} ACTIVE", cell("ID", 36), cell("NAME", 24));
    for member in staff {
        out.push_str(&format!(
            "\n{} {} {}",
            cell(&member.id, 36),
            cell(&member.name, 24),
            if member.is_active { "yes" } else { "no" }
        ));
    }
    out
}

pub async fn customers(ctx: &Context, cmd: CustomerCommand) -> CommandResult {
    let customers = ctx.db.customers();

    match cmd {
        CustomerCommand::Add {
            name,
            phone,
            address,
        } => {
            let customer = customers
                .insert(&name, phone.as_deref(), address.as_deref())
                .await?;
            ctx.emit(&customer, || format!("Added {} ({})", customer.name, customer.id))
        }
        CustomerCommand::List { query, limit } => {
            let found = customers.search(&query, limit).await?;
            ctx.emit(&found, || customer_table(&found))
        }
    }
}

fn customer_table(customers: &[Customer]) -> String {
    let mut out = format!("{} {} {} ADDRESS", cell("ID", 36), cell("NAME", 24), cell("PHONE", 10));
    for customer in customers {
        out.push_str(&format!(
            "\n{} {} {} {}",
            cell(&customer.id, 36),
            cell(&customer.name, 24),
            cell(customer.phone.as_deref().unwrap_or("-"), 10),
            customer.address.as_deref().unwrap_or("")
        ));
    }
    out
}
