use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::domain::age::parse_birthdate;
use crate::domain::models::Child as DomainChild;
use shared::{Child as SharedChild, ChildListResponse, ChildResponse};

/// Mapper to convert between shared Child DTOs and domain Child models.
pub struct ChildMapper;

impl ChildMapper {
    /// Converts a shared Child DTO to a domain Child model.
    pub fn to_domain(dto: SharedChild) -> Result<DomainChild> {
        let created_at = DateTime::parse_from_rfc3339(&dto.created_at)
            .context("Failed to parse created_at from shared DTO")?
            .with_timezone(&Utc);

        Ok(DomainChild {
            id: dto.id,
            name: dto.name,
            nickname: dto.nickname,
            birthdate: dto.birthdate.as_deref().and_then(parse_birthdate),
            parent_id: dto.parent_id,
            profile: dto.profile,
            created_at,
        })
    }

    /// Converts a domain Child model to a shared Child DTO.
    pub fn to_dto(domain: DomainChild) -> SharedChild {
        SharedChild {
            id: domain.id,
            name: domain.name,
            nickname: domain.nickname,
            birthdate: domain.birthdate.map(|d| d.format("%Y-%m-%d").to_string()),
            parent_id: domain.parent_id,
            profile: domain.profile,
            created_at: domain.created_at.to_rfc3339(),
        }
    }

    pub fn to_child_list_dto(domain_children: Vec<DomainChild>) -> ChildListResponse {
        ChildListResponse {
            children: domain_children.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_created_response_dto(domain: DomainChild) -> ChildResponse {
        let success_message = format!("{} has been successfully added to your profile.", domain.name);
        ChildResponse {
            child: Self::to_dto(domain),
            success_message,
        }
    }
}
