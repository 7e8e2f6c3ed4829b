//! Well-known tag and parameter keys used as ownership join keys
//!
//! Every key except [`TAG_NAME`] is only a default; the reconciler reads the
//! effective keys from `ClaimKeys` in the configuration.
//!
//! | Key | Carried by | Joins |
//! |-----|------------|-------|
//! | `Name` | any resource | display name |
//! | `DatabaseID` | instance tag | instance → managed DB cluster |
//! | `cluster` | instance tag | managed DB cluster → managed cluster (by name) |
//! | `CloudID` | managed cluster tag | managed cluster → managed DB account |
//! | `CloudID` | stack parameter | stack → managed DB account |

/// Tag carrying a resource's display name
pub const TAG_NAME: &str = "Name";

/// Instance tag naming the managed DB cluster the instance is a node of
pub const DEFAULT_CLUSTER_ID_TAG: &str = "DatabaseID";

/// Instance tag naming the managed (Kubernetes) cluster the node runs in
pub const DEFAULT_CLUSTER_NAME_TAG: &str = "cluster";

/// Managed cluster tag naming the owning managed DB account
pub const DEFAULT_ACCOUNT_ID_TAG: &str = "CloudID";

/// Stack parameter naming the owning managed DB account
pub const DEFAULT_ACCOUNT_ID_PARAMETER: &str = "CloudID";

/// Declared stack resource type denoting a compute instance
pub const DEFAULT_INSTANCE_RESOURCE_TYPE: &str = "AWS::EC2::Instance";
