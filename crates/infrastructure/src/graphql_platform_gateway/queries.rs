pub(super) const CURRENT_USER: &str = r"
query currentUser {
    currentUser {
        username
        siteAdmin
    }
}";

pub(super) const ROLES: &str = r"
query roles {
    roles {
        nodes {
            id
            name
            permissions {
                nodes {
                    id
                    displayName
                    namespace
                    action
                }
            }
        }
    }
}";

pub(super) const USERS: &str = r"
query users {
    users {
        nodes {
            id
            username
            emails {
                email
                verified
            }
            roles {
                nodes {
                    id
                    name
                }
            }
        }
    }
}";

pub(super) const SET_ROLES: &str = r"
mutation setRoles($userId: ID!, $roleIds: [ID!]!) {
    setRoles(user: $userId, roles: $roleIds) {
        alwaysNil
    }
}";

pub(super) const CREATE_USER: &str = r"
mutation createUser($username: String!, $email: String) {
    createUser(username: $username, email: $email) {
        user {
            id
            username
            emails {
                email
                verified
            }
        }
    }
}";
