//! REST API fronting the compute function.
//!
//! Two paths are exposed: `/<public_path>` and `/<public_path>/{proxy+}`.
//! `ANY` on either goes to the function through a proxy integration;
//! `OPTIONS` is answered by a mock integration carrying the CORS headers.

use strata_common::config::Settings;
use strata_common::error::Result;
use strata_construct::attribute::{AttrValue, TemplatePart};
use strata_construct::construct::{ConstructId, ConstructTree};
use strata_construct::resource::{ResourceHandle, ResourceType};

/// Local name of the API construct.
pub const API_CONSTRUCT_NAME: &str = "workshop-api";

const RESPONSE_MODEL: &str = "ResponseSchema";
const JSON_CONTENT_TYPE: &str = "application/json";
const CORS_ALLOW_HEADERS: &str = "'Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token,X-Amz-User-Agent,Velocity-Cfg-Id,Accept-Language,Access-Control-Allow-Origin'";
const CORS_ALLOW_METHODS: &str = "'DELETE,GET,HEAD,OPTIONS,PATCH,POST,PUT'";
const CORS_ALLOW_ORIGIN: &str = "'*'";
const CORS_HEADER_NAMES: [&str; 3] = [
    "method.response.header.Access-Control-Allow-Headers",
    "method.response.header.Access-Control-Allow-Methods",
    "method.response.header.Access-Control-Allow-Origin",
];

/// Inputs the API needs from the rest of the composition.
#[derive(Debug, Clone)]
pub struct ApiGatewayProps<'a> {
    /// Function every `ANY` request is proxied to.
    pub function: &'a ResourceHandle,
    /// First path segment of the API.
    pub public_path: &'a str,
}

/// Handles of the API subtree.
#[derive(Debug, Clone)]
pub struct ApiGateway {
    /// The API construct.
    pub construct: ConstructId,
    /// The REST API.
    pub api: ResourceHandle,
    /// Stage deployment.
    pub deployment: ResourceHandle,
}

/// The two API paths and their methods.
struct Routes {
    resource: ResourceHandle,
    proxy_resource: ResourceHandle,
    method_any: ResourceHandle,
    proxy_any: ResourceHandle,
    method_options: ResourceHandle,
    proxy_options: ResourceHandle,
}

/// Adds the REST API under `parent`.
///
/// # Errors
///
/// Returns `StrataError::DuplicateName` if the subtree already exists under
/// `parent`.
pub fn add_api_gateway(
    tree: &mut ConstructTree,
    parent: ConstructId,
    settings: &Settings,
    props: &ApiGatewayProps<'_>,
) -> Result<ApiGateway> {
    let name = API_CONSTRUCT_NAME;
    let construct = tree.create_child(parent, name)?;

    let api = tree
        .resource(construct, format!("api-gateway-rest-{name}"), ResourceType::RestApi)
        .attr("name", format!("{}-api-{}", settings.name, settings.environment))
        .add()?;

    let _ = tree
        .resource(construct, format!("responseSchema-{name}"), ResourceType::ApiModel)
        .depends_on(&api)
        .attr("rest_api_id", api.attr("id"))
        .attr("name", RESPONSE_MODEL)
        .attr("description", "")
        .attr("content_type", JSON_CONTENT_TYPE)
        .attr("schema", response_schema())
        .add()?;

    let routes = add_routes(tree, construct, name, &api, props.public_path)?;

    let proxy_integration = tree
        .resource(construct, format!("{name}-proxy-integration-changed"), ResourceType::ApiIntegration)
        .attr("http_method", routes.proxy_any.attr("http_method"))
        .attr("resource_id", routes.proxy_any.attr("resource_id"))
        .attr("rest_api_id", api.attr("id"))
        .attr("type", "AWS_PROXY")
        .attr("integration_http_method", "POST")
        .attr("uri", props.function.attr("invoke_arn"))
        .add()?;

    let root_integration = tree
        .resource(construct, format!("{name}-integration-root-changed"), ResourceType::ApiIntegration)
        .attr("rest_api_id", api.attr("id"))
        .attr("resource_id", routes.method_any.attr("resource_id"))
        .attr("http_method", routes.method_any.attr("http_method"))
        .attr("type", "AWS_PROXY")
        .attr("integration_http_method", "POST")
        .attr("uri", props.function.attr("invoke_arn"))
        .add()?;

    add_responses(tree, construct, name, &api, &routes, &proxy_integration, &root_integration)?;

    let deployment = tree
        .resource(construct, format!("{name}-deployment"), ResourceType::ApiDeployment)
        .depends_on(&proxy_integration)
        .depends_on(&root_integration)
        .attr("rest_api_id", api.attr("id"))
        .attr("stage_name", settings.environment.as_str())
        .add()?;

    let _ = tree
        .resource(
            construct,
            format!("{}-apigateway-lambda-permission", settings.name),
            ResourceType::LambdaPermission,
        )
        .attr("action", "lambda:InvokeFunction")
        .attr("function_name", props.function.attr("function_name"))
        .attr("principal", "apigateway.amazonaws.com")
        .attr(
            "source_arn",
            AttrValue::template([api.reference("execution_arn").into(), TemplatePart::from("/*/*")]),
        )
        .add()?;

    let _ = tree
        .resource(construct, "Backend URL", ResourceType::Output)
        .attr(
            "value",
            AttrValue::template([
                deployment.reference("invoke_url").into(),
                TemplatePart::from(format!("/{}/welcome", props.public_path)),
            ]),
        )
        .add()?;

    tracing::info!(environment = %settings.environment, api = %api.logical_id(), "REST API composed");
    Ok(ApiGateway {
        construct,
        api,
        deployment,
    })
}

fn add_routes(
    tree: &mut ConstructTree,
    construct: ConstructId,
    name: &str,
    api: &ResourceHandle,
    public_path: &str,
) -> Result<Routes> {
    let resource = tree
        .resource(construct, format!("api-resource-{name}"), ResourceType::ApiResource)
        .attr("rest_api_id", api.attr("id"))
        .attr("parent_id", api.attr("root_resource_id"))
        .attr("path_part", public_path)
        .add()?;

    let proxy_resource = tree
        .resource(construct, format!("api-proxy-resource-{name}"), ResourceType::ApiResource)
        .attr("rest_api_id", api.attr("id"))
        .attr("parent_id", resource.attr("id"))
        .attr("path_part", "{proxy+}")
        .add()?;

    let mut method = |suffix: String, on: &ResourceHandle, http_method: &str| {
        tree.resource(construct, suffix, ResourceType::ApiMethod)
            .attr("rest_api_id", api.attr("id"))
            .attr("resource_id", on.attr("id"))
            .attr("http_method", http_method)
            .attr("authorization", "NONE")
            .add()
    };

    let method_any = method(format!("api-method-any-{name}"), &resource, "ANY")?;
    let proxy_any = method(format!("api-proxy-any-{name}"), &proxy_resource, "ANY")?;
    let method_options = method(format!("api-method-opitions-{name}"), &resource, "OPTIONS")?;
    let proxy_options = method(format!("api-method-proxy-opitions-{name}"), &proxy_resource, "OPTIONS")?;

    Ok(Routes {
        resource,
        proxy_resource,
        method_any,
        proxy_any,
        method_options,
        proxy_options,
    })
}

fn add_responses(
    tree: &mut ConstructTree,
    construct: ConstructId,
    name: &str,
    api: &ResourceHandle,
    routes: &Routes,
    proxy_integration: &ResourceHandle,
    root_integration: &ResourceHandle,
) -> Result<()> {
    let empty_json_template = || AttrValue::map([(JSON_CONTENT_TYPE, AttrValue::from(""))]);

    let _ = tree
        .resource(construct, format!("IntegrationResponse-{name}"), ResourceType::ApiIntegrationResponse)
        .depends_on(proxy_integration)
        .depends_on(&routes.method_any)
        .depends_on(&routes.resource)
        .attr("rest_api_id", api.attr("id"))
        .attr("resource_id", routes.method_any.attr("resource_id"))
        .attr("http_method", routes.method_any.attr("http_method"))
        .attr("status_code", "200")
        .attr("response_templates", empty_json_template())
        .add()?;

    let _ = tree
        .resource(
            construct,
            format!("IntegrationResponseAnyProxy-{name}"),
            ResourceType::ApiIntegrationResponse,
        )
        .depends_on(proxy_integration)
        .depends_on(&routes.proxy_any)
        .depends_on(&routes.proxy_resource)
        .attr("rest_api_id", api.attr("id"))
        .attr("resource_id", routes.proxy_any.attr("resource_id"))
        .attr("http_method", routes.proxy_any.attr("http_method"))
        .attr("status_code", "200")
        .attr("response_templates", empty_json_template())
        .add()?;

    let any_models = || AttrValue::map([(JSON_CONTENT_TYPE, AttrValue::from(RESPONSE_MODEL))]);

    let _ = tree
        .resource(construct, format!("api-proxy-any-response-{name}"), ResourceType::ApiMethodResponse)
        .attr("rest_api_id", api.attr("id"))
        .attr("resource_id", routes.proxy_resource.attr("id"))
        .attr("http_method", "ANY")
        .attr("status_code", "200")
        .attr("response_models", any_models())
        .add()?;

    let _ = tree
        .resource(construct, format!("api-any-response-{name}"), ResourceType::ApiMethodResponse)
        .depends_on(&routes.method_any)
        .attr("rest_api_id", api.attr("id"))
        .attr("resource_id", routes.resource.attr("id"))
        .attr("http_method", "ANY")
        .attr("status_code", "200")
        .attr("response_models", any_models())
        .add()?;

    for (suffix, method, on) in [
        (format!("options-response-{name}"), &routes.method_options, &routes.resource),
        (format!("options-proxy-response-{name}"), &routes.proxy_options, &routes.proxy_resource),
    ] {
        let _ = tree
            .resource(construct, suffix, ResourceType::ApiMethodResponse)
            .depends_on(method)
            .depends_on(on)
            .attr("rest_api_id", api.attr("id"))
            .attr("resource_id", on.attr("id"))
            .attr("http_method", method.attr("http_method"))
            .attr("status_code", "200")
            .attr("response_parameters", declared_cors_headers())
            .add()?;
    }

    for (suffix, method, on) in [
        (format!("{name}-integration-proxyLamdbaMock"), &routes.method_options, &routes.resource),
        (format!("{name}-integration-proxyMock"), &routes.proxy_options, &routes.proxy_resource),
    ] {
        let _ = tree
            .resource(construct, suffix, ResourceType::ApiIntegration)
            .attr("rest_api_id", api.attr("id"))
            .attr("resource_id", on.attr("id"))
            .attr("http_method", method.attr("http_method"))
            .attr("type", "MOCK")
            .attr(
                "request_templates",
                AttrValue::map([(JSON_CONTENT_TYPE, AttrValue::from(r#"{"statusCode": 200}"#))]),
            )
            .add()?;
    }

    let _ = tree
        .resource(
            construct,
            format!("IntegrationResponseOptions-method-proxy-{name}-changed"),
            ResourceType::ApiIntegrationResponse,
        )
        .depends_on(&routes.proxy_options)
        .depends_on(&routes.proxy_resource)
        .depends_on(root_integration)
        .depends_on(proxy_integration)
        .attr("rest_api_id", api.attr("id"))
        .attr("resource_id", routes.proxy_resource.attr("id"))
        .attr("http_method", routes.proxy_options.attr("http_method"))
        .attr("status_code", "200")
        .attr("response_parameters", cors_header_values())
        .add()?;

    let _ = tree
        .resource(
            construct,
            format!("IntegrationResponseLamdba-method-proxy-{name}-changed"),
            ResourceType::ApiIntegrationResponse,
        )
        .depends_on(&routes.proxy_options)
        .depends_on(&routes.resource)
        .depends_on(root_integration)
        .depends_on(proxy_integration)
        .attr("rest_api_id", api.attr("id"))
        .attr("resource_id", routes.resource.attr("id"))
        .attr("http_method", routes.proxy_options.attr("http_method"))
        .attr("status_code", "200")
        .attr("response_parameters", cors_header_values())
        .attr("response_templates", empty_json_template())
        .add()?;

    Ok(())
}

/// CORS headers a method response declares, none of them required.
fn declared_cors_headers() -> AttrValue {
    AttrValue::map(CORS_HEADER_NAMES.map(|h| (h, AttrValue::from(false))))
}

/// CORS header values an integration response fills in.
fn cors_header_values() -> AttrValue {
    let [headers, methods, origin] = CORS_HEADER_NAMES;
    AttrValue::map([
        (headers, AttrValue::from(CORS_ALLOW_HEADERS)),
        (methods, AttrValue::from(CORS_ALLOW_METHODS)),
        (origin, AttrValue::from(CORS_ALLOW_ORIGIN)),
    ])
}

fn response_schema() -> AttrValue {
    AttrValue::encoded(AttrValue::map([
        ("type", AttrValue::from("object")),
        ("required", AttrValue::list(["response"])),
        (
            "properties",
            AttrValue::map([(
                "response",
                AttrValue::map([("type", AttrValue::from("string"))]),
            )]),
        ),
        ("title", AttrValue::from("Response Schema")),
    ]))
}

#[cfg(test)]
mod tests {
    use strata_common::config::workshop_environments;

    use super::*;

    fn compose() -> (ConstructTree, ApiGateway) {
        let settings = workshop_environments().remove(0);
        let mut tree = ConstructTree::new("dev");
        let root = tree.root();
        let function = tree
            .resource(root, "fn", ResourceType::Function)
            .add()
            .expect("function");
        let props = ApiGatewayProps {
            function: &function,
            public_path: "public",
        };
        let api = add_api_gateway(&mut tree, root, &settings, &props).expect("api");
        (tree, api)
    }

    #[test]
    fn api_declares_full_resource_set() {
        let (tree, _) = compose();
        // One function stub plus the API subtree.
        assert_eq!(tree.resource_count(), 1 + 23);
    }

    #[test]
    fn deployment_waits_for_both_proxy_integrations() {
        let (tree, api) = compose();
        let node = tree.resource_node(&api.deployment).expect("deployment");
        let explicit: Vec<&str> = node.explicit_depends_on.iter().map(|id| id.as_str()).collect();
        assert_eq!(
            explicit,
            vec![
                "workshop-api_workshop-api-integration-root-changed",
                "workshop-api_workshop-api-proxy-integration-changed",
            ]
        );
        assert_eq!(node.attributes["stage_name"], AttrValue::from("dev"));
    }

    #[test]
    fn rest_api_is_named_per_environment() {
        let (tree, api) = compose();
        let node = tree.resource_node(&api.api).expect("api");
        assert_eq!(node.attributes["name"], AttrValue::from("cdktfworkshop-dev-api-dev"));
        assert_eq!(api.api.logical_id().as_str(), "workshop-api_api-gateway-rest-workshop-api");
    }

    #[test]
    fn declared_cors_headers_are_optional() {
        let AttrValue::Map(headers) = declared_cors_headers() else {
            panic!("expected a map");
        };
        assert_eq!(headers.len(), 3);
        assert!(headers.values().all(|v| *v == AttrValue::Bool(false)));
    }
}
