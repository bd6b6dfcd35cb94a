//! Groups and members that metrics are computed over.
//!
//! A *group* is an analyzable unit (a course) and its *members* are the
//! users actively enrolled in it. Which groups qualify is decided by an
//! [`EntitySource`] under an explicit [`InclusionPolicy`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

pub type GroupId = u64;
pub type MemberId = u64;

/// A member as seen by metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Last recorded activity; `None` if the member was never active.
    pub last_activity: Option<DateTime<Utc>>,
}

/// Which groups are eligible for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InclusionPolicy {
    /// Skip hidden groups and groups inside hidden categories.
    pub exclude_hidden_groups: bool,
    /// Only include groups whose start/end window contains `now`.
    pub respect_active_window: bool,
}

impl Default for InclusionPolicy {
    fn default() -> Self {
        Self {
            exclude_hidden_groups: true,
            respect_active_window: true,
        }
    }
}

/// Provides analyzable groups and their members.
#[cfg_attr(test, mockall::automock)]
pub trait EntitySource {
    /// Groups eligible for analysis at `now`, in ascending id order.
    fn list_analyzable_groups(&self, now: DateTime<Utc>) -> Result<Vec<GroupId>, SourceError>;

    /// Active members of `group` at `now`, in ascending id order.
    fn list_members(&self, group: GroupId, now: DateTime<Utc>)
        -> Result<Vec<Member>, SourceError>;
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Group record held by [`InMemoryEntitySource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub shortname: String,
    pub visible: bool,
    pub category_visible: bool,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Group {
    /// A visible group in a visible category with an open-ended window.
    pub fn new(id: GroupId, shortname: impl Into<String>) -> Self {
        Self {
            id,
            shortname: shortname.into(),
            visible: true,
            category_visible: true,
            start: None,
            end: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn in_hidden_category(mut self) -> Self {
        self.category_visible = false;
        self
    }

    pub fn with_window(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    fn is_visible(&self) -> bool {
        self.visible && self.category_visible
    }

    /// Open at `now`: started strictly before and not yet ended.
    fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| start < now) && self.end.map_or(true, |end| end > now)
    }
}

/// Member record held by [`InMemoryEntitySource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: MemberId,
    pub last_activity: Option<DateTime<Utc>>,
    pub suspended: bool,
    pub deleted: bool,
}

impl MemberRecord {
    pub fn new(id: MemberId, last_activity: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            last_activity,
            suspended: false,
            deleted: false,
        }
    }

    fn is_active(&self) -> bool {
        !self.suspended && !self.deleted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Enrolment {
    member: MemberId,
    group: GroupId,
    active: bool,
}

/// Entity source backed by in-memory records.
///
/// A group is analyzable when it is not the site group, passes the
/// [`InclusionPolicy`], and has at least one active enrolment of a member who
/// is neither suspended nor deleted.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use nla_stats::entities::{EntitySource, Group, InMemoryEntitySource, InclusionPolicy, MemberRecord};
///
/// let mut source = InMemoryEntitySource::new(InclusionPolicy::default());
/// source.add_group(Group::new(1, "maths"));
/// source.add_group(Group::new(2, "empty"));
/// source.add_member(MemberRecord::new(10, None));
/// source.enrol(10, 1);
///
/// assert_eq!(source.list_analyzable_groups(Utc::now()).unwrap(), vec![1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitySource {
    policy: InclusionPolicy,
    site_group: Option<GroupId>,
    groups: BTreeMap<GroupId, Group>,
    members: BTreeMap<MemberId, MemberRecord>,
    enrolments: Vec<Enrolment>,
}

impl InMemoryEntitySource {
    pub fn new(policy: InclusionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Marks `id` as the site-wide group, which is never analyzed.
    pub fn with_site_group(mut self, id: GroupId) -> Self {
        self.site_group = Some(id);
        self
    }

    pub fn policy(&self) -> &InclusionPolicy {
        &self.policy
    }

    pub fn add_group(&mut self, group: Group) {
        self.groups.insert(group.id, group);
    }

    pub fn add_member(&mut self, member: MemberRecord) {
        self.members.insert(member.id, member);
    }

    /// Adds an active enrolment of `member` in `group`.
    pub fn enrol(&mut self, member: MemberId, group: GroupId) {
        self.enrolments.push(Enrolment {
            member,
            group,
            active: true,
        });
    }

    /// Adds a suspended enrolment, which never counts towards analysis.
    pub fn enrol_suspended(&mut self, member: MemberId, group: GroupId) {
        self.enrolments.push(Enrolment {
            member,
            group,
            active: false,
        });
    }

    pub fn suspend_member(&mut self, id: MemberId) {
        if let Some(m) = self.members.get_mut(&id) {
            m.suspended = true;
        }
    }

    pub fn delete_member(&mut self, id: MemberId) {
        if let Some(m) = self.members.get_mut(&id) {
            m.deleted = true;
        }
    }

    fn group_passes_policy(&self, group: &Group, now: DateTime<Utc>) -> bool {
        if self.site_group == Some(group.id) {
            return false;
        }
        if self.policy.exclude_hidden_groups && !group.is_visible() {
            return false;
        }
        if self.policy.respect_active_window && !group.is_open_at(now) {
            return false;
        }
        true
    }

    /// Members with an active enrolment in `group`, deduplicated by id.
    fn active_members(&self, group: GroupId) -> impl Iterator<Item = &MemberRecord> + '_ {
        let ids: BTreeSet<MemberId> = self
            .enrolments
            .iter()
            .filter(|e| e.group == group && e.active)
            .map(|e| e.member)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.members.get(&id))
            .filter(|m| m.is_active())
    }
}

impl EntitySource for InMemoryEntitySource {
    fn list_analyzable_groups(&self, now: DateTime<Utc>) -> Result<Vec<GroupId>, SourceError> {
        let groups: Vec<GroupId> = self
            .groups
            .values()
            .filter(|g| self.group_passes_policy(g, now))
            .filter(|g| self.active_members(g.id).next().is_some())
            .map(|g| g.id)
            .collect();
        log::debug!(
            "{} of {} groups analyzable under {:?}",
            groups.len(),
            self.groups.len(),
            self.policy
        );
        Ok(groups)
    }

    fn list_members(&self, group: GroupId, _now: DateTime<Utc>) -> Result<Vec<Member>, SourceError> {
        if !self.groups.contains_key(&group) {
            return Err(SourceError::UnknownGroup(group));
        }
        Ok(self
            .active_members(group)
            .map(|m| Member {
                id: m.id,
                last_activity: m.last_activity,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_509_584_382, 0).unwrap()
    }

    fn source() -> InMemoryEntitySource {
        let mut s = InMemoryEntitySource::new(InclusionPolicy::default()).with_site_group(1);
        s.add_group(Group::new(1, "site"));
        s.add_member(MemberRecord::new(100, None));
        s.add_member(MemberRecord::new(101, Some(now() - Duration::days(2))));
        s
    }

    #[test]
    fn test_no_enrolments() {
        let mut s = source();
        s.add_group(Group::new(2, "c1"));
        assert!(s.list_analyzable_groups(now()).unwrap().is_empty());
    }

    #[test]
    fn test_enrolled_group_only() {
        let mut s = source();
        s.add_group(Group::new(2, "c1"));
        s.add_group(Group::new(3, "c2"));
        s.enrol(100, 2);
        assert_eq!(s.list_analyzable_groups(now()).unwrap(), vec![2]);
    }

    #[test]
    fn test_site_group_never_analyzed() {
        let mut s = source();
        s.enrol(100, 1);
        assert!(s.list_analyzable_groups(now()).unwrap().is_empty());
    }

    #[test]
    fn test_hidden_group() {
        let mut s = source();
        s.add_group(Group::new(2, "c1"));
        s.add_group(Group::new(3, "c2").hidden());
        s.enrol(100, 2);
        s.enrol(100, 3);
        assert_eq!(s.list_analyzable_groups(now()).unwrap(), vec![2]);
    }

    #[test]
    fn test_hidden_category() {
        let mut s = source();
        s.add_group(Group::new(2, "c1").in_hidden_category());
        s.add_group(Group::new(3, "c2").hidden().in_hidden_category());
        s.enrol(100, 2);
        s.enrol(100, 3);
        assert!(s.list_analyzable_groups(now()).unwrap().is_empty());
    }

    #[test]
    fn test_hidden_included_when_policy_off() {
        let policy = InclusionPolicy {
            exclude_hidden_groups: false,
            ..InclusionPolicy::default()
        };
        let mut s = InMemoryEntitySource::new(policy);
        s.add_group(Group::new(2, "c1").hidden());
        s.add_member(MemberRecord::new(100, None));
        s.enrol(100, 2);
        assert_eq!(s.list_analyzable_groups(now()).unwrap(), vec![2]);
    }

    #[test]
    fn test_suspended_member() {
        let mut s = source();
        s.add_group(Group::new(2, "c1"));
        s.add_group(Group::new(3, "c2"));
        s.enrol(100, 2);
        s.enrol(101, 3);
        s.suspend_member(101);
        assert_eq!(s.list_analyzable_groups(now()).unwrap(), vec![2]);
    }

    #[test]
    fn test_deleted_member() {
        let mut s = source();
        s.add_group(Group::new(2, "c1"));
        s.add_group(Group::new(3, "c2"));
        s.enrol(100, 2);
        s.enrol(101, 3);
        s.delete_member(101);
        assert_eq!(s.list_analyzable_groups(now()).unwrap(), vec![2]);
    }

    #[test]
    fn test_suspended_enrolment() {
        let mut s = source();
        s.add_group(Group::new(2, "c1"));
        s.add_group(Group::new(3, "c2"));
        s.enrol(100, 2);
        s.enrol_suspended(101, 3);
        assert_eq!(s.list_analyzable_groups(now()).unwrap(), vec![2]);
    }

    #[test]
    fn test_active_window() {
        let mut s = source();
        let t = now();
        s.add_group(Group::new(2, "future").with_window(Some(t + Duration::seconds(1000)), None));
        s.add_group(Group::new(3, "current").with_window(
            Some(t - Duration::seconds(1000)),
            Some(t + Duration::seconds(1000)),
        ));
        s.add_group(Group::new(4, "ended").with_window(None, Some(t - Duration::seconds(1))));
        for g in [2, 3, 4] {
            s.enrol(100, g);
        }
        assert_eq!(s.list_analyzable_groups(t).unwrap(), vec![3]);

        let mut open = s.clone();
        open.policy.respect_active_window = false;
        assert_eq!(open.list_analyzable_groups(t).unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn test_list_members() {
        let mut s = source();
        s.add_group(Group::new(2, "c1"));
        s.add_member(MemberRecord::new(102, None));
        s.enrol(101, 2);
        s.enrol(100, 2);
        s.enrol(100, 2);
        s.enrol_suspended(102, 2);

        let members = s.list_members(2, now()).unwrap();
        let ids: Vec<MemberId> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![100, 101]);
        assert_eq!(members[0].last_activity, None);
        assert_eq!(members[1].last_activity, Some(now() - Duration::days(2)));
    }

    #[test]
    fn test_list_members_unknown_group() {
        let s = source();
        assert!(matches!(
            s.list_members(99, now()),
            Err(SourceError::UnknownGroup(99))
        ));
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: InclusionPolicy = toml::from_str("respect_active_window = false").unwrap();
        assert!(policy.exclude_hidden_groups);
        assert!(!policy.respect_active_window);
    }
}
