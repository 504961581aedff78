use chrono::Utc;
use ulid::Ulid;

use crate::model::*;

/// Name of the status whose rooms can be booked.
pub const ACTIVE_STATUS_NAME: &str = "Ativo";

/// First-start data: three statuses, three active rooms, an admin and a standard user.
///
/// Ids are fixed so a fresh store is reproducible.
pub fn default_events() -> Vec<Event> {
    let statuses = [(1, ACTIVE_STATUS_NAME), (2, "Inativo"), (3, "Manutenção")];
    let active = Ulid(1);

    let rooms = [
        (11, "Sala Executiva", 12, "Sala principal para reuniões executivas"),
        (12, "Sala Criativa", 8, "Espaço para brainstorming e workshops"),
        (13, "Sala de Treinamento", 20, "Equipada com projetor e quadro interativo"),
    ];

    let now = Utc::now();
    let users = [
        (21, "Administrador", "admin", "admin123", Role::Admin),
        (22, "João Silva", "joao", "user123", Role::Standard),
    ];

    let mut events = Vec::with_capacity(statuses.len() + rooms.len() + users.len());
    events.extend(
        statuses
            .into_iter()
            .map(|(id, name)| Event::StatusCreated(RoomStatus { id: Ulid(id), name: name.to_string() })),
    );
    events.extend(rooms.into_iter().map(|(id, name, capacity, description)| {
        Event::RoomCreated(Room {
            id: Ulid(id),
            name: name.to_string(),
            status_id: active,
            capacity,
            description: Some(description.to_string()),
        })
    }));
    events.extend(users.into_iter().map(|(id, name, login, password, role)| {
        Event::UserCreated(User {
            id: Ulid(id),
            name: name.to_string(),
            login: login.to_string(),
            password: password.to_string(),
            role,
            created_at: now,
        })
    }));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InMemoryStore;

    #[test]
    fn seed_contents() {
        let store = InMemoryStore::from_events(&default_events());
        let statuses: Vec<_> = store.statuses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(statuses, ["Ativo", "Inativo", "Manutenção"]);
        assert_eq!(store.rooms.len(), 3);
        assert!(store.rooms.iter().all(|r| r.status_id == store.statuses[0].id));
        assert_eq!(store.users.iter().filter(|u| u.is_admin()).count(), 1);
        assert_eq!(store.users.len(), 2);
        assert!(store.bookings.is_empty());
    }
}
