//! Source to CloudWatch Log Group Mapping
//!
//! Turns what the user typed on the command line into a log group name.

#![warn(clippy::all, rust_2018_idioms)]

/// Resolve a log source identifier to a log group name.
///
/// - `/aws/...` and any other absolute name is already a log group
/// - `arn:aws:logs:<region>:<account>:log-group:<name>[:*]` yields `<name>`
/// - `arn:aws:lambda:<region>:<account>:function:<name>[:<qualifier>]` yields `/aws/lambda/<name>`
/// - anything else is taken to be a Lambda function name
pub fn resolve_log_group_name(source: &str) -> String {
    let source = source.trim();

    if source.starts_with('/') {
        return source.to_string();
    }

    if let Some(name) = log_group_from_arn(source) {
        return name;
    }

    lambda_log_group(source)
}

/// Lambda: /aws/lambda/{function-name}
pub fn lambda_log_group(function_name: &str) -> String {
    format!("/aws/lambda/{}", function_name)
}

fn log_group_from_arn(arn: &str) -> Option<String> {
    // arn:partition:service:region:account:resource
    let mut parts = arn.splitn(6, ':');
    if parts.next()? != "arn" {
        return None;
    }
    let _partition = parts.next()?;
    let service = parts.next()?;
    let _region = parts.next()?;
    let _account = parts.next()?;
    let resource = parts.next()?;

    match service {
        "logs" => {
            let name = resource.strip_prefix("log-group:")?;
            let name = name.strip_suffix(":*").unwrap_or(name);
            (!name.is_empty()).then(|| name.to_string())
        }
        "lambda" => {
            let name = resource.strip_prefix("function:")?;
            let name = name.split(':').next().unwrap_or(name);
            (!name.is_empty()).then(|| lambda_log_group(name))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_group_names_pass_through() {
        assert_eq!(
            resolve_log_group_name("/aws/apigateway/orders"),
            "/aws/apigateway/orders"
        );
        assert_eq!(resolve_log_group_name("  /custom/app  "), "/custom/app");
    }

    #[test]
    fn test_function_name_maps_to_lambda_group() {
        assert_eq!(
            resolve_log_group_name("checkout-handler"),
            "/aws/lambda/checkout-handler"
        );
    }

    #[test]
    fn test_log_group_arn() {
        assert_eq!(
            resolve_log_group_name("arn:aws:logs:us-east-1:123456789012:log-group:/ecs/web:*"),
            "/ecs/web"
        );
        assert_eq!(
            resolve_log_group_name("arn:aws:logs:eu-west-1:123456789012:log-group:/ecs/web"),
            "/ecs/web"
        );
    }

    #[test]
    fn test_lambda_arn_drops_qualifier() {
        assert_eq!(
            resolve_log_group_name("arn:aws:lambda:us-east-1:123456789012:function:api:prod"),
            "/aws/lambda/api"
        );
    }

    #[test]
    fn test_unrecognised_arn_is_treated_as_function_name() {
        // No log group can be derived from an S3 ARN
        assert_eq!(
            resolve_log_group_name("arn:aws:s3:::bucket"),
            "/aws/lambda/arn:aws:s3:::bucket"
        );
    }
}
