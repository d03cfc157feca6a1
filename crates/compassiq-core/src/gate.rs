//! The permission gate.
//!
//! Pure functions of the tenant context. Client-side disabling of
//! controls is a UX nicety only — every mutating operation re-evaluates
//! this gate server-side, even when the caller already did.

use crate::context::TenantContext;
use crate::error::{CompassError, CompassResult};

/// Whether the context may mutate tenant data at all.
pub fn can_mutate(ctx: &TenantContext) -> bool {
    ctx.is_admin() && !ctx.is_demo
}

/// Human-readable denial reason for the current context.
pub fn reason_for(ctx: &TenantContext) -> &'static str {
    if ctx.is_demo {
        "Demo org is read-only"
    } else {
        "OWNER/ADMIN permission required"
    }
}

/// Short-circuit guard for mutating operations.
///
/// The demo check wins over the role check so that an ADMIN in a demo
/// org receives the `DEMO_READ_ONLY` code, not a role complaint.
pub fn ensure_can_mutate(ctx: &TenantContext) -> CompassResult<()> {
    if ctx.is_demo {
        return Err(CompassError::DemoReadOnly);
    }
    if !ctx.is_admin() {
        return Err(CompassError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::Role;
    use uuid::Uuid;

    fn ctx(role: Role, is_demo: bool) -> TenantContext {
        TenantContext::new(Uuid::new_v4(), "alice@example.com", role, is_demo)
    }

    #[test]
    fn admin_in_live_org_may_mutate() {
        assert!(can_mutate(&ctx(Role::Owner, false)));
        assert!(can_mutate(&ctx(Role::Admin, false)));
        assert!(ensure_can_mutate(&ctx(Role::Admin, false)).is_ok());
    }

    #[test]
    fn non_admin_roles_are_forbidden() {
        for role in [Role::Finance, Role::Ops, Role::Sales, Role::Viewer] {
            let c = ctx(role, false);
            assert!(!can_mutate(&c));
            assert!(matches!(
                ensure_can_mutate(&c),
                Err(CompassError::Forbidden)
            ));
            assert_eq!(reason_for(&c), "OWNER/ADMIN permission required");
        }
    }

    #[test]
    fn demo_org_is_read_only_even_for_admins() {
        let c = ctx(Role::Owner, true);
        assert!(!can_mutate(&c));
        let err = ensure_can_mutate(&c).unwrap_err();
        assert!(matches!(err, CompassError::DemoReadOnly));
        assert_eq!(err.code(), Some("DEMO_READ_ONLY"));
        assert_eq!(reason_for(&c), "Demo org is read-only");
    }
}
