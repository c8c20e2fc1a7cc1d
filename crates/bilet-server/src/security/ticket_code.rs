//! Unique QR codes for tickets.
//!
//! Each ticket carries an HMAC-SHA256 code over its identifying triple plus
//! a random nonce, so codes are unguessable and unique even for repeat
//! purchases of the same ticket type.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use bilet_core::{EventId, TicketTypeId, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Generate the unique activation code for a new ticket.
pub fn generate_ticket_code(
    secret: &str,
    event_id: EventId,
    user_id: UserId,
    ticket_type_id: TicketTypeId,
) -> String {
    compute(secret, event_id, user_id, ticket_type_id, rand::random())
}

fn compute(
    secret: &str,
    event_id: EventId,
    user_id: UserId,
    ticket_type_id: TicketTypeId,
    nonce: u64,
) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{event_id}:{user_id}:{ticket_type_id}:{nonce}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_code() {
        let a = compute("s", EventId(1), UserId(2), TicketTypeId(3), 42);
        let b = compute("s", EventId(1), UserId(2), TicketTypeId(3), 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn any_changed_input_changes_the_code() {
        let base = compute("s", EventId(1), UserId(2), TicketTypeId(3), 42);
        assert_ne!(base, compute("s", EventId(9), UserId(2), TicketTypeId(3), 42));
        assert_ne!(base, compute("s", EventId(1), UserId(9), TicketTypeId(3), 42));
        assert_ne!(base, compute("s", EventId(1), UserId(2), TicketTypeId(9), 42));
        assert_ne!(base, compute("s", EventId(1), UserId(2), TicketTypeId(3), 43));
        assert_ne!(base, compute("x", EventId(1), UserId(2), TicketTypeId(3), 42));
    }

    #[test]
    fn repeat_purchases_get_distinct_codes() {
        let a = generate_ticket_code("s", EventId(1), UserId(2), TicketTypeId(3));
        let b = generate_ticket_code("s", EventId(1), UserId(2), TicketTypeId(3));
        assert_ne!(a, b);
    }
}
