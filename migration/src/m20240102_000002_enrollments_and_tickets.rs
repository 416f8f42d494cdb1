use sea_orm_migration::prelude::*;

use crate::m20240101_000001_init::{Users, timestamp};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollments::Name).string().not_null())
                    .col(ColumnDef::new(Enrollments::Cpf).string_len(11).not_null().unique_key())
                    .col(
                        ColumnDef::new(Enrollments::Birthday)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::Phone).string().not_null())
                    .col(
                        ColumnDef::new(Enrollments::UserId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(&mut timestamp(Enrollments::CreatedAt))
                    .col(&mut timestamp(Enrollments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollments_user")
                            .from(Enrollments::Table, Enrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketTypes::Name).string().not_null())
                    .col(ColumnDef::new(TicketTypes::Price).integer().not_null())
                    .col(
                        ColumnDef::new(TicketTypes::IsRemote)
                            .boolean()
                            .not_null()
                            .default(Expr::value(false)),
                    )
                    .col(
                        ColumnDef::new(TicketTypes::IncludesHotel)
                            .boolean()
                            .not_null()
                            .default(Expr::value(false)),
                    )
                    .col(&mut timestamp(TicketTypes::CreatedAt))
                    .col(&mut timestamp(TicketTypes::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::TicketTypeId).integer().not_null())
                    .col(
                        ColumnDef::new(Tickets::EnrollmentId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string_len(16)
                            .not_null()
                            .default("RESERVED"),
                    )
                    .col(&mut timestamp(Tickets::CreatedAt))
                    .col(&mut timestamp(Tickets::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_ticket_type")
                            .from(Tickets::Table, Tickets::TicketTypeId)
                            .to(TicketTypes::Table, TicketTypes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_enrollment")
                            .from(Tickets::Table, Tickets::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TicketTypes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    Name,
    Cpf,
    Birthday,
    Phone,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TicketTypes {
    Table,
    Id,
    Name,
    Price,
    IsRemote,
    IncludesHotel,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    TicketTypeId,
    EnrollmentId,
    Status,
    CreatedAt,
    UpdatedAt,
}
