use super::{
    ContributionDependency, ContributionShort, ContributionWithAttributesPublic,
    ContributorReviewedContributions, ContributorShort, ContributorViewPublic,
    ContributorWithAttributesPublic, ReviewShort, TagPublic, TagViewPublic,
};
use crate::model::contribution::Contribution;
use crate::model::contributor::Contributor;
use crate::model::tag::Tag;
use crate::repo::contribution_repo::{ContributionRepository, SqliteContributionRepository};
use crate::repo::contributor_repo::{ContributorRepository, SqliteContributorRepository};
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::RepoResult;
use crate::service::contributor_service::ContributorService;
use crate::service::ServiceResult;
use rusqlite::Connection;

/// Builds read projections by querying associations explicitly.
pub struct ViewAssembler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ViewAssembler<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Full contribution view.
    ///
    /// `contributors` may carry the list a write path already resolved; when
    /// `None` the stored order is queried.
    pub fn contribution(
        &self,
        contribution: Contribution,
        contributors: Option<&[Contributor]>,
    ) -> RepoResult<ContributionWithAttributesPublic> {
        let contributors = self.contributors_of(&contribution.id, contributors)?;
        let tags = self.tags_of(&contribution.id)?;
        let reviews = self.reviews_of(&contribution.id)?;
        let mut dependencies = Vec::new();
        for dependency in SqliteContributionRepository::new(self.conn)
            .list_dependencies(&contribution.id)?
        {
            dependencies.push(self.contribution_short(&dependency, None)?);
        }

        Ok(ContributionWithAttributesPublic {
            id: contribution.id,
            title: contribution.title,
            short_title: contribution.short_title,
            date: contribution.date,
            description: contribution.description,
            links: contribution.links,
            discord_chat_link: contribution.discord_chat_link,
            github_link: contribution.github_link,
            forum_link: contribution.forum_link,
            wiki_link: contribution.wiki_link,
            archived_at: contribution.archived_at,
            archive_reason: contribution.archive_reason,
            created_at: contribution.created_at,
            updated_at: contribution.updated_at,
            contributors,
            tags,
            reviews,
            dependencies,
        })
    }

    /// One-level contribution view; dependencies render as leaves.
    pub fn contribution_short(
        &self,
        contribution: &Contribution,
        contributors: Option<&[Contributor]>,
    ) -> RepoResult<ContributionShort> {
        let dependencies = SqliteContributionRepository::new(self.conn)
            .list_dependencies(&contribution.id)?
            .iter()
            .map(ContributionDependency::from)
            .collect();

        Ok(ContributionShort {
            id: contribution.id.clone(),
            title: contribution.title.clone(),
            short_title: contribution.short_title.clone(),
            date: contribution.date,
            discord_chat_link: contribution.discord_chat_link.clone(),
            github_link: contribution.github_link.clone(),
            forum_link: contribution.forum_link.clone(),
            wiki_link: contribution.wiki_link.clone(),
            archived_at: contribution.archived_at,
            archive_reason: contribution.archive_reason.clone(),
            contributors: self.contributors_of(&contribution.id, contributors)?,
            tags: self.tags_of(&contribution.id)?,
            reviews: self.reviews_of(&contribution.id)?,
            dependencies,
        })
    }

    pub fn contribution_shorts(
        &self,
        contributions: &[Contribution],
    ) -> RepoResult<Vec<ContributionShort>> {
        contributions
            .iter()
            .map(|contribution| self.contribution_short(contribution, None))
            .collect()
    }

    pub fn contributor(
        &self,
        contributor: Contributor,
    ) -> RepoResult<ContributorWithAttributesPublic> {
        let contributions = SqliteContributionRepository::new(self.conn)
            .list_for_contributor(contributor.id)?;
        Ok(ContributorWithAttributesPublic {
            id: contributor.id,
            local_handle: contributor.local_handle,
            display_name: contributor.display_name,
            discord_handle: contributor.discord_handle,
            github_account: contributor.github_account,
            discourse_account: contributor.discourse_account,
            wiki_account: contributor.wiki_account,
            website: contributor.website,
            extra_info: contributor.extra_info,
            created_at: contributor.created_at,
            updated_at: contributor.updated_at,
            contributions: self.contribution_shorts(&contributions)?,
        })
    }

    /// Contributor page including reviewed contributions.
    pub fn contributor_view(
        &self,
        contributor: Contributor,
    ) -> ServiceResult<ContributorViewPublic> {
        let reviewed = self.reviewed_contributions(contributor.id)?;
        Ok(ContributorViewPublic {
            contributor: self.contributor(contributor)?,
            reviewed_contributions: reviewed.reviewed_contributions,
        })
    }

    pub fn reviewed_contributions(
        &self,
        contributor_id: i64,
    ) -> ServiceResult<ContributorReviewedContributions> {
        let contributions =
            ContributorService::new(self.conn).reviewed_contributions(contributor_id)?;
        Ok(ContributorReviewedContributions {
            reviewed_contributions: self.contribution_shorts(&contributions)?,
        })
    }

    pub fn tag_view(&self, tag: &Tag) -> RepoResult<TagViewPublic> {
        let contributions = SqliteContributionRepository::new(self.conn).list_for_tag(tag.id)?;
        Ok(TagViewPublic {
            tag: TagPublic::from(tag),
            contributions: self.contribution_shorts(&contributions)?,
        })
    }

    fn contributors_of(
        &self,
        contribution_id: &str,
        prefetched: Option<&[Contributor]>,
    ) -> RepoResult<Vec<ContributorShort>> {
        let contributors = match prefetched {
            Some(contributors) => contributors.to_vec(),
            None => SqliteContributorRepository::new(self.conn)
                .list_for_contribution(contribution_id)?,
        };
        Ok(contributors.iter().map(ContributorShort::from).collect())
    }

    fn tags_of(&self, contribution_id: &str) -> RepoResult<Vec<TagPublic>> {
        Ok(SqliteTagRepository::new(self.conn)
            .list_for_contribution(contribution_id)?
            .iter()
            .map(TagPublic::from)
            .collect())
    }

    fn reviews_of(&self, contribution_id: &str) -> RepoResult<Vec<ReviewShort>> {
        Ok(SqliteReviewRepository::new(self.conn)
            .list_ids_for_contribution(contribution_id)?
            .into_iter()
            .map(|id| ReviewShort { id })
            .collect())
    }
}
