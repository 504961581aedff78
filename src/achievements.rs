use serde::Serialize;

use crate::stats::UserStats;

/// A fixed threshold over a user's stats.
pub struct Milestone {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    unlocked_by: fn(&UserStats) -> bool,
}

impl Milestone {
    pub fn is_unlocked(&self, stats: &UserStats) -> bool {
        (self.unlocked_by)(stats)
    }
}

pub const MILESTONES: [Milestone; 4] = [
    Milestone {
        id: "1",
        title: "Primeiro Passo",
        description: "Primeiro agendamento realizado",
        icon: "star",
        unlocked_by: |s| s.total_bookings >= 1,
    },
    Milestone {
        id: "2",
        title: "Organizador",
        description: "5 agendamentos realizados",
        icon: "calendar",
        unlocked_by: |s| s.total_bookings >= 5,
    },
    Milestone {
        id: "3",
        title: "Maratonista",
        description: "Reunião de 2+ horas",
        icon: "clock",
        unlocked_by: |s| s.longest_meeting_hours >= 2.0,
    },
    Milestone {
        id: "4",
        title: "Expert",
        description: "10+ horas em reuniões",
        icon: "trophy",
        unlocked_by: |s| s.total_hours >= 10.0,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub unlocked: bool,
}

/// Every milestone with its current state. Nothing is stored; call again after the stats change.
pub fn evaluate(stats: &UserStats) -> Vec<Achievement> {
    MILESTONES
        .iter()
        .map(|m| Achievement {
            id: m.id,
            title: m.title,
            description: m.description,
            icon: m.icon,
            unlocked: m.is_unlocked(stats),
        })
        .collect()
}
