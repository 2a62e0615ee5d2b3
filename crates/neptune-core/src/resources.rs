use crate::client::PlatformApi;
use crate::error::{NeptuneError, Result};
use crate::models::{DatabaseConnectionInfo, ResourceKind, ResourceState, ResourceStatus};
use serde::Serialize;

/// Region the platform provisions buckets in.
pub const BUCKET_REGION: &str = "eu-west-2";

// ---------------------------------------------------------------------------
// Resource documentation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceInfo {
    pub kind: ResourceKind,
    pub description: &'static str,
    #[serde(rename = "neptune_json_configuration")]
    pub neptune_json_example: String,
    #[serde(rename = "example_code_usage")]
    pub code_usage_example: &'static str,
}

fn spec_snippet(kind: &ResourceKind, placeholder: &str, example: &str) -> String {
    format!(
        "Add an entry to `resources` in neptune.json:\n\n\
         ```json\n{{ \"kind\": \"{kind}\", \"name\": \"{placeholder}\" }}\n```\n\n\
         Full example:\n\n\
         ```json\n{{\n  \"kind\": \"Service\",\n  \"name\": \"my-project\",\n  \
         \"resources\": [\n    {{ \"kind\": \"{kind}\", \"name\": \"{example}\" }}\n  ]\n}}\n```"
    )
}

pub fn resource_info(kind: ResourceKind) -> ResourceInfo {
    let (description, placeholder, example, code_usage_example) = match &kind {
        ResourceKind::Database => (
            "Managed PostgreSQL database.",
            "<database_name>",
            "main-db",
            "Once provisioned, fetch credentials with\n  \
                neptune resource database info <database_name>\n\n\
                Deployed services receive the connection details as environment \
                variables; read them at startup instead of hardcoding them.",
        ),
        ResourceKind::StorageBucket => (
            "S3-compatible object storage bucket.",
            "<bucket_name>",
            "uploads",
            "Address the bucket by its provider id (shown by `neptune status`) \
                with any S3 client, region eu-west-2. Deployed services receive \
                AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY automatically.\n\n\
                Locally, inspect contents with `neptune resource bucket list <bucket_name>` \
                and `neptune resource bucket get <bucket_name> <key>`.",
        ),
        ResourceKind::Secret => (
            "Secret value such as an API key or credential.",
            "<secret_name>",
            "api-key",
            "Once provisioned, set its value with\n  \
                neptune resource secret set <secret_name>\n\n\
                Read it in the service from AWS Secrets Manager using the secret's \
                provider id (shown by `neptune status`).",
        ),
        ResourceKind::Other(_) => (
            "Resource kind this version of neptune has no documentation for.",
            "<name>",
            "my-resource",
            "Run `neptune schema` to see the resource kinds the platform accepts.",
        ),
    };
    ResourceInfo {
        neptune_json_example: spec_snippet(&kind, placeholder, example),
        kind,
        description,
        code_usage_example,
    }
}

// ---------------------------------------------------------------------------
// Resource operations
// ---------------------------------------------------------------------------

/// Look up a declared resource on the live project.
pub fn find_resource(
    api: &dyn PlatformApi,
    project: &str,
    kind: ResourceKind,
    name: &str,
) -> Result<ResourceStatus> {
    let p = api
        .get_project(project)?
        .ok_or_else(|| NeptuneError::ProjectNotFound(project.to_string()))?;
    p.find_resource(&kind, name)
        .cloned()
        .ok_or_else(|| NeptuneError::ResourceNotFound {
            project: project.to_string(),
            kind,
            name: name.to_string(),
        })
}

pub fn set_secret_value(
    api: &dyn PlatformApi,
    project: &str,
    secret: &str,
    value: &str,
) -> Result<()> {
    find_resource(api, project, ResourceKind::Secret, secret)?;
    api.set_secret(project, secret, value)?;
    tracing::info!(project, secret, "secret value updated");
    Ok(())
}

pub fn get_database_connection_info(
    api: &dyn PlatformApi,
    project: &str,
    database: &str,
) -> Result<DatabaseConnectionInfo> {
    find_resource(api, project, ResourceKind::Database, database)?;
    api.get_database_connection_info(project, database)
}

pub fn list_bucket_files(
    api: &dyn PlatformApi,
    project: &str,
    bucket: &str,
) -> Result<Vec<String>> {
    find_resource(api, project, ResourceKind::StorageBucket, bucket)?;
    api.list_bucket_keys(project, bucket)
}

pub fn get_bucket_object(
    api: &dyn PlatformApi,
    project: &str,
    bucket: &str,
    key: &str,
) -> Result<Vec<u8>> {
    find_resource(api, project, ResourceKind::StorageBucket, bucket)?;
    api.get_bucket_object(project, bucket, key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BucketConnection {
    Ready {
        bucket_name: String,
        bucket_id: String,
        region: &'static str,
    },
    Pending {
        bucket_name: String,
        state: String,
    },
}

/// Provider id and region for a bucket, or `Pending` while it is provisioning.
pub fn bucket_connection_info(
    api: &dyn PlatformApi,
    project: &str,
    bucket: &str,
) -> Result<BucketConnection> {
    let res = find_resource(api, project, ResourceKind::StorageBucket, bucket)?;
    match (&res.status, res.aws_id) {
        (ResourceState::Available, Some(id)) => Ok(BucketConnection::Ready {
            bucket_name: bucket.to_string(),
            bucket_id: id,
            region: BUCKET_REGION,
        }),
        (state, _) => Ok(BucketConnection::Pending {
            bucket_name: bucket.to_string(),
            state: state.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectSpec, ResourceDeclaration};
    use crate::testing::StubApi;

    fn api_with(resources: &[(ResourceKind, &str)]) -> StubApi {
        let api = StubApi::default();
        let mut spec = ProjectSpec::new("demo");
        for (kind, name) in resources {
            spec.resources.push(ResourceDeclaration {
                kind: kind.clone(),
                name: name.to_string(),
            });
        }
        api.provision_now(&spec);
        api
    }

    #[test]
    fn info_exists_for_every_kind() {
        for kind in ResourceKind::ALL {
            let info = resource_info(kind.clone());
            assert_eq!(info.kind, kind);
            assert!(info.neptune_json_example.contains(kind.as_str()));
        }
    }

    #[test]
    fn unknown_kind_info_still_shows_the_json_entry() {
        let info = resource_info(ResourceKind::Other("Queue".into()));
        assert!(info.neptune_json_example.contains("\"kind\": \"Queue\""));
        assert_eq!(
            serde_json::to_value(&info).unwrap()["kind"],
            serde_json::json!("Queue")
        );
    }

    #[test]
    fn secret_must_be_declared() {
        let api = api_with(&[(ResourceKind::Database, "api-key")]);
        let err = set_secret_value(&api, "demo", "api-key", "v").unwrap_err();
        match err {
            NeptuneError::ResourceNotFound { kind, name, .. } => {
                assert_eq!(kind, ResourceKind::Secret);
                assert_eq!(name, "api-key");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(api.calls("set_secret"), 0);
    }

    #[test]
    fn secret_is_set_when_declared() {
        let api = api_with(&[(ResourceKind::Secret, "api-key")]);
        set_secret_value(&api, "demo", "api-key", "v").unwrap();
        assert_eq!(api.secret("api-key").as_deref(), Some("v"));
    }

    #[test]
    fn missing_project_is_project_not_found() {
        let api = StubApi::default();
        let err = list_bucket_files(&api, "ghost", "b").unwrap_err();
        assert!(matches!(err, NeptuneError::ProjectNotFound(_)));
    }

    #[test]
    fn bucket_listing_and_connection() {
        let api = api_with(&[(ResourceKind::StorageBucket, "uploads")]);
        api.set_bucket_keys(vec!["a.txt".into(), "b/c.txt".into()]);
        assert_eq!(
            list_bucket_files(&api, "demo", "uploads").unwrap(),
            vec!["a.txt", "b/c.txt"]
        );
        match bucket_connection_info(&api, "demo", "uploads").unwrap() {
            BucketConnection::Ready {
                bucket_id, region, ..
            } => {
                assert_eq!(bucket_id, "demo-uploads");
                assert_eq!(region, "eu-west-2");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn database_info_requires_database_kind() {
        let api = api_with(&[(ResourceKind::Database, "main")]);
        let info = get_database_connection_info(&api, "demo", "main").unwrap();
        assert_eq!(info.port, 5432);
        assert!(get_database_connection_info(&api, "demo", "other").is_err());
    }
}
