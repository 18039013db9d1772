//! Order status lifecycle
//!
//! The happy path is PENDING -> PROCESSING -> SHIPPED -> DELIVERED,
//! with early cancellation out of PENDING or PROCESSING. DELIVERED and
//! CANCELLED are terminal for everyone, administrators included.
//!
//! Callers parse the requested value first, then check authorization
//! against the stored status read immediately before the write.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::OrderStatus;

/// Parse a raw status value from the wire
///
/// Unknown values are reported as their own error, not as a failed
/// transition, so a typo is distinguishable from a forbidden move.
pub fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(|_| {
        AppError::with_message(
            ErrorCode::InvalidStatusValue,
            format!("Unknown order status value: {}", raw),
        )
        .with_detail("status", raw)
    })
}

/// Decide whether a status change is allowed
///
/// `current` is the stored status at the time of the request. Admins
/// may jump to any status from a non-terminal one. The order's owner
/// may only cancel, and only while the order is PENDING or PROCESSING.
/// Anyone else is refused outright.
pub fn authorize_transition(
    current: OrderStatus,
    requested: OrderStatus,
    is_admin: bool,
    is_owner: bool,
) -> AppResult<()> {
    if current.is_terminal() {
        return Err(AppError::invalid_transition(
            current.as_str(),
            requested.as_str(),
        ));
    }

    if is_admin {
        return Ok(());
    }

    if !is_owner {
        return Err(AppError::new(ErrorCode::NotResourceOwner));
    }

    if requested != OrderStatus::Cancelled {
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            format!(
                "Only an administrator can move an order to {}",
                requested.as_str()
            ),
        ));
    }

    match current {
        OrderStatus::Pending | OrderStatus::Processing => Ok(()),
        _ => Err(AppError::invalid_transition(
            current.as_str(),
            OrderStatus::Cancelled.as_str(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_statuses() {
        assert_eq!(parse_status("PENDING").unwrap(), OrderStatus::Pending);
        assert_eq!(parse_status("PROCESSING").unwrap(), OrderStatus::Processing);
        assert_eq!(parse_status("SHIPPED").unwrap(), OrderStatus::Shipped);
        assert_eq!(parse_status("DELIVERED").unwrap(), OrderStatus::Delivered);
        assert_eq!(parse_status("CANCELLED").unwrap(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_parse_unknown_status() {
        let err = parse_status("REFUNDED").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusValue);
        assert!(err.message.contains("REFUNDED"));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let err = parse_status("pending").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusValue);
    }

    #[test]
    fn test_admin_walks_happy_path() {
        let steps = [
            (OrderStatus::Pending, OrderStatus::Processing),
            (OrderStatus::Processing, OrderStatus::Shipped),
            (OrderStatus::Shipped, OrderStatus::Delivered),
        ];
        for (from, to) in steps {
            assert!(authorize_transition(from, to, true, false).is_ok());
        }
    }

    #[test]
    fn test_admin_may_skip_states() {
        assert!(authorize_transition(OrderStatus::Pending, OrderStatus::Delivered, true, false).is_ok());
        assert!(authorize_transition(OrderStatus::Shipped, OrderStatus::Pending, true, false).is_ok());
        assert!(authorize_transition(OrderStatus::Shipped, OrderStatus::Cancelled, true, false).is_ok());
    }

    #[test]
    fn test_admin_cannot_leave_terminal() {
        let err = authorize_transition(OrderStatus::Delivered, OrderStatus::Shipped, true, true)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        let err = authorize_transition(OrderStatus::Cancelled, OrderStatus::Pending, true, true)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_owner_cancels_early() {
        assert!(
            authorize_transition(OrderStatus::Pending, OrderStatus::Cancelled, false, true).is_ok()
        );
        assert!(
            authorize_transition(OrderStatus::Processing, OrderStatus::Cancelled, false, true)
                .is_ok()
        );
    }

    #[test]
    fn test_owner_cannot_cancel_after_shipping() {
        let err = authorize_transition(OrderStatus::Shipped, OrderStatus::Cancelled, false, true)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_owner_cannot_cancel_terminal() {
        let err = authorize_transition(OrderStatus::Delivered, OrderStatus::Cancelled, false, true)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        let err = authorize_transition(OrderStatus::Cancelled, OrderStatus::Cancelled, false, true)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_owner_cannot_advance_status() {
        let err = authorize_transition(OrderStatus::Pending, OrderStatus::Shipped, false, true)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = authorize_transition(OrderStatus::Pending, OrderStatus::Processing, false, true)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[test]
    fn test_stranger_is_refused() {
        let err = authorize_transition(OrderStatus::Pending, OrderStatus::Cancelled, false, false)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotResourceOwner);

        let err = authorize_transition(OrderStatus::Processing, OrderStatus::Shipped, false, false)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotResourceOwner);
    }
}
