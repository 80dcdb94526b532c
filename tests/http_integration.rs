// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the login, session and device flows using wiremock.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use serde_json::json;
use weback_lib::{
    CleanRobot, ClientConfig, Credentials, Device, Error, GatewayError, RobotState, ShadowCommand,
    Thermostat, WebackClient,
};
use wiremock::matchers::{
    body_json, body_partial_json, header, header_exists, method, path, path_regex, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PATH: &str = "/WeBack/WeBack_Login_Ats_V3";
const LOGIN: &str = "user@example.com";
// MD5 of "password"
const PASSWORD_MD5: &str = "5f4dcc3b5aa765d61d8327deb882cf99";
const REGION: &str = "eu-central-1";
const IDENTITY_ID: &str = "eu-central-1:0000-1111";
const TOKEN: &str = "vendor-token";
const SESSION_TOKEN: &str = "session-token";

fn config(server: &MockServer) -> ClientConfig {
    let uri = server.uri();
    ClientConfig::default()
        .with_login_url(format!("{uri}{LOGIN_PATH}"))
        .with_identity_endpoint(uri.clone())
        .with_lambda_endpoint(uri.clone())
        .with_iot_endpoint(uri)
}

fn client(server: &MockServer, credentials: Credentials) -> Arc<WebackClient> {
    Arc::new(
        WebackClient::builder()
            .config(config(server))
            .credentials(credentials)
            .build()
            .unwrap(),
    )
}

fn default_client(server: &MockServer) -> Arc<WebackClient> {
    client(server, Credentials::new(LOGIN, "password"))
}

async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({
            "App_Version": "android_3.9.3",
            "Password": PASSWORD_MD5,
            "User_Account": LOGIN
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Request_Result": "success",
            "Fail_Reason": "",
            "Region_Info": REGION,
            "Identity_Id": IDENTITY_ID,
            "Token": TOKEN
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_identity(server: &MockServer, expires_in: TimeDelta, expected_calls: u64) {
    #[allow(clippy::cast_precision_loss)]
    let expiration = (Utc::now() + expires_in).timestamp() as f64;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header(
            "x-amz-target",
            "AWSCognitoIdentityService.GetCredentialsForIdentity",
        ))
        .and(body_json(json!({
            "IdentityId": IDENTITY_ID,
            "Logins": { "cognito-identity.amazonaws.com": TOKEN }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "IdentityId": IDENTITY_ID,
            "Credentials": {
                "AccessKeyId": "ASIAEXAMPLE",
                "SecretKey": "secret-key",
                "SessionToken": SESSION_TOKEN,
                "Expiration": expiration
            }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_session(server: &MockServer) {
    mount_login(server, 1).await;
    mount_identity(server, TimeDelta::hours(1), 1).await;
}

async fn mount_data_endpoint(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/endpoint"))
        .and(query_param("endpointType", "iot:Data-ATS"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "endpointAddress": server.uri()
        })))
        .mount(server)
        .await;
}

async fn mount_shadow(server: &MockServer, thing: &str, reported: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/things/{thing}/shadow")))
        .and(header("x-amz-security-token", SESSION_TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": { "reported": reported },
            "version": 7,
            "timestamp": 1_700_000_000
        })))
        .mount(server)
        .await;
}

fn publish_mock(desired: serde_json::Value) -> Mock {
    Mock::given(method("POST"))
        .and(path_regex(r"^/topics/.+"))
        .and(query_param("qos", "0"))
        .and(header_exists("authorization"))
        .and(body_partial_json(json!({ "state": { "desired": desired } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
}

// ============================================================================
// Credential broker
// ============================================================================

mod broker {
    use super::*;

    #[tokio::test]
    async fn authenticate_sends_md5_password() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;

        let client = default_client(&server);
        let auth = client.broker().authenticate(None, None).await.unwrap();

        assert!(auth.is_success());
        assert_eq!(auth.region().unwrap(), REGION);
        assert_eq!(auth.identity_id().unwrap(), IDENTITY_ID);
    }

    #[tokio::test]
    async fn authenticate_prefixes_country_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_partial_json(json!({ "User_Account": "+7-9001234567" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Request_Result": "success",
                "Region_Info": REGION,
                "Identity_Id": IDENTITY_ID,
                "Token": TOKEN
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(
            &server,
            Credentials::new("9001234567", "password").with_country_code("7"),
        );
        client.broker().authenticate(None, None).await.unwrap();
    }

    #[tokio::test]
    async fn explicit_credentials_override_stored_ones() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_partial_json(json!({
                "User_Account": "other@example.com",
                "Password": "e10adc3949ba59abbe56e057f20f883e"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Request_Result": "success"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = default_client(&server);
        client
            .broker()
            .authenticate(Some("other@example.com"), Some("123456"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejected_login_carries_vendor_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Request_Result": "fail",
                "Fail_Reason": "PasswordError"
            })))
            .mount(&server)
            .await;

        let client = default_client(&server);
        let err = client.session().await.unwrap_err();

        assert!(matches!(err, Error::Authentication { ref reason } if reason == "PasswordError"));
        assert!(client.broker().cached_session().await.is_none());
    }

    #[tokio::test]
    async fn missing_credentials_make_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = WebackClient::builder()
            .config(config(&server))
            .build()
            .unwrap();
        let err = client.session().await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials("login")));
    }

    #[tokio::test]
    async fn session_is_cached_while_valid() {
        let server = MockServer::start().await;
        mount_session(&server).await;

        let client = default_client(&server);
        let first = client.session().await.unwrap();
        let second = client.session().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.region(), REGION);
        assert_eq!(first.identity_id(), IDENTITY_ID);
        assert!(first.is_valid());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_callers_share_one_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "Request_Result": "success",
                        "Region_Info": REGION,
                        "Identity_Id": IDENTITY_ID,
                        "Token": TOKEN
                    }))
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_identity(&server, TimeDelta::hours(1), 1).await;

        let client = default_client(&server);
        let (first, second, third) =
            tokio::join!(client.session(), client.session(), client.session());
        let (first, second, third) = (first.unwrap(), second.unwrap(), third.unwrap());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
    }

    #[tokio::test]
    async fn expired_session_is_replaced() {
        let server = MockServer::start().await;
        mount_login(&server, 2).await;
        mount_identity(&server, TimeDelta::seconds(-30), 2).await;

        let client = default_client(&server);
        let first = client.session().await.unwrap();
        assert!(!first.is_valid());

        let second = client.session().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn failed_exchange_caches_nothing() {
        let server = MockServer::start().await;
        mount_login(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "NotAuthorizedException",
                "message": "Invalid login token."
            })))
            .mount(&server)
            .await;

        let client = default_client(&server);
        let err = client.session().await.unwrap_err();

        match err {
            Error::Authentication { reason } => {
                assert_eq!(reason, "NotAuthorizedException: Invalid login token.");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(client.broker().cached_session().await.is_none());
    }
}

// ============================================================================
// Device gateway
// ============================================================================

mod gateway {
    use super::*;

    #[tokio::test]
    async fn list_devices_queries_device_manager() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/2015-03-31/functions/Device_Manager_V2/invocations"))
            .and(header("x-amz-invocation-type", "RequestResponse"))
            .and(header("x-amz-security-token", SESSION_TOKEN))
            .and(header_exists("authorization"))
            .and(body_json(json!({
                "Device_Manager_Request": "query",
                "Identity_Id": IDENTITY_ID,
                "Region_Info": REGION
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Request_Result": "success",
                "Request_Cotent": [
                    { "Thing_Name": "robot-1", "Thing_Nick_Name": "Kitchen", "Sub_type": "clean_robot" },
                    { "Thing_Name": "thermo-1" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = default_client(&server);
        let devices = client.list_devices().await.unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].nickname(), "Kitchen");
        assert_eq!(devices[0].sub_type(), Some("clean_robot"));
        assert_eq!(devices[1].nickname(), "thermo-1");
    }

    #[tokio::test]
    async fn list_devices_function_error() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/2015-03-31/functions/Device_Manager_V2/invocations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Amz-Function-Error", "Unhandled")
                    .set_body_json(json!({ "errorMessage": "boom" })),
            )
            .mount(&server)
            .await;

        let err = default_client(&server).list_devices().await.unwrap_err();
        match err {
            Error::Gateway(GatewayError::FunctionError { function, .. }) => {
                assert_eq!(function, "Device_Manager_V2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn list_devices_without_content_is_malformed() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/2015-03-31/functions/Device_Manager_V2/invocations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Request_Result": "success"
            })))
            .mount(&server)
            .await;

        let err = default_client(&server).list_devices().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Gateway(GatewayError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn list_devices_rejected() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/2015-03-31/functions/Device_Manager_V2/invocations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Request_Result": "fail",
                "Fail_Reason": "IdentityNotFound"
            })))
            .mount(&server)
            .await;

        let err = default_client(&server).list_devices().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Gateway(GatewayError::Rejected(ref reason)) if reason == "IdentityNotFound"
        ));
    }

    async fn mount_endpoint_address(server: &MockServer, address: &str) {
        Mock::given(method("GET"))
            .and(path("/endpoint"))
            .and(query_param("endpointType", "iot:Data-ATS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "endpointAddress": address
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn bare_endpoint_address_gets_https_scheme() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_endpoint_address(&server, "abc-ats.iot.eu-central-1.amazonaws.com").await;

        let endpoint = default_client(&server).data_endpoint().await.unwrap();
        assert_eq!(endpoint, "https://abc-ats.iot.eu-central-1.amazonaws.com");
    }

    #[tokio::test]
    async fn endpoint_address_trailing_slash_is_trimmed() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_endpoint_address(&server, "abc-ats.iot.eu-central-1.amazonaws.com/").await;

        let endpoint = default_client(&server).data_endpoint().await.unwrap();
        assert_eq!(endpoint, "https://abc-ats.iot.eu-central-1.amazonaws.com");
    }

    #[tokio::test]
    async fn endpoint_address_with_scheme_is_kept() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_endpoint_address(&server, &format!("{}/", server.uri())).await;

        let endpoint = default_client(&server).data_endpoint().await.unwrap();
        assert_eq!(endpoint, server.uri());
    }

    #[tokio::test]
    async fn full_shadow_document() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        mount_shadow(&server, "robot-1", json!({ "working_status": "Charging" })).await;

        let doc = default_client(&server)
            .shadow_document("robot-1")
            .await
            .unwrap();
        assert_eq!(doc.version, Some(7));
        assert_eq!(doc.reported().get_str("working_status"), Some("Charging"));
    }

    #[tokio::test]
    async fn missing_shadow() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/ghost/shadow"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404,
                "message": "No shadow exists with name: 'ghost'"
            })))
            .mount(&server)
            .await;

        let err = default_client(&server).shadow("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Gateway(GatewayError::NoShadow { ref thing }) if thing == "ghost"
        ));
    }

    #[tokio::test]
    async fn publish_batch_command() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        publish_mock(json!({ "fan_status": "Strong", "water_level": "High" }))
            .expect(1)
            .mount(&server)
            .await;

        let command = ShadowCommand::new()
            .with("fan_status", "Strong")
            .with("water_level", "High");
        let ack = default_client(&server)
            .publish("robot-1", &command)
            .await
            .unwrap();

        assert_eq!(ack.topic, "$aws/things/robot-1/shadow/update");
        assert_eq!(ack.qos, 0);
    }
}

// ============================================================================
// Device façades
// ============================================================================

mod devices {
    use super::*;

    #[tokio::test]
    async fn robot_update_decodes_state() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        mount_shadow(
            &server,
            "robot-1",
            json!({
                "working_status": "AutoClean",
                "battery_level": 76,
                "clean_time": 300,
                "connected": "true"
            }),
        )
        .await;

        let mut robot = CleanRobot::new(Device::new("robot-1", default_client(&server)));
        assert_eq!(robot.state(), RobotState::Unknown);

        robot.update().await.unwrap();

        assert_eq!(robot.state(), RobotState::Cleaning);
        assert_eq!(robot.battery_level(), Some(76));
        assert_eq!(robot.clean_time(), Some(300));
        assert!(robot.is_cleaning());
    }

    #[tokio::test]
    async fn description_is_fetched_once() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/robot-1"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "thingName": "robot-1",
                "thingTypeName": "clean_robot",
                "attributes": {},
                "version": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut device = Device::new("robot-1", default_client(&server));
        let first = device.description().await.unwrap().clone();
        let second = device.description().await.unwrap();

        assert_eq!(&first, second);
        assert_eq!(first.thing_type_name.as_deref(), Some("clean_robot"));
    }

    #[tokio::test]
    async fn robot_commands_publish_working_status() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        publish_mock(json!({ "working_status": "AutoClean" }))
            .expect(1)
            .mount(&server)
            .await;
        publish_mock(json!({ "working_status": "BackCharging" }))
            .expect(2)
            .mount(&server)
            .await;
        publish_mock(json!({ "working_status": "Standby" }))
            .expect(1)
            .mount(&server)
            .await;

        let robot = CleanRobot::new(Device::new("robot-1", default_client(&server)));
        robot.turn_on().await.unwrap();
        robot.turn_off().await.unwrap();
        robot.return_home().await.unwrap();
        robot.stop().await.unwrap();
    }

    #[tokio::test]
    async fn robot_fan_and_mop() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        publish_mock(json!({ "fan_status": "Normal" }))
            .expect(1)
            .mount(&server)
            .await;
        publish_mock(json!({ "water_level": "Low" }))
            .expect(1)
            .mount(&server)
            .await;

        let robot = CleanRobot::new(Device::new("robot-1", default_client(&server)));
        robot.set_fan("Normal").await.unwrap();
        robot.set_mop("Low").await.unwrap();
    }

    #[tokio::test]
    async fn invalid_fan_speed_is_not_published() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let robot = CleanRobot::new(Device::new("robot-1", default_client(&server)));
        let err = robot.set_fan("Turbo").await.unwrap_err();

        match err {
            Error::Value(value) => assert_eq!(value.allowed(), ["Normal", "Strong"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn thermostat_set_temp_forces_manual_mode() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        publish_mock(json!({ "workmode": "hand" }))
            .expect(1)
            .mount(&server)
            .await;
        publish_mock(json!({ "set_tem": 50 }))
            .expect(1)
            .mount(&server)
            .await;

        let thermostat = Thermostat::new(Device::new("thermo-1", default_client(&server)));
        thermostat.set_temp(25.0).await.unwrap();

        let desired: Vec<serde_json::Value> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path().starts_with("/topics/"))
            .map(|request| {
                let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
                body["state"]["desired"].clone()
            })
            .collect();
        assert_eq!(
            desired,
            [json!({ "workmode": "hand" }), json!({ "set_tem": 50 })]
        );
    }

    #[tokio::test]
    async fn thermostat_invalid_mode_is_not_published() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let thermostat = Thermostat::new(Device::new("thermo-1", default_client(&server)));
        let err = thermostat.set_mode("eco").await.unwrap_err();

        match err {
            Error::Value(value) => assert_eq!(value.allowed(), ["auto", "hand"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn thermostat_update_decodes_schedule() {
        let server = MockServer::start().await;
        mount_session(&server).await;
        mount_data_endpoint(&server).await;
        mount_shadow(
            &server,
            "thermo-1",
            json!({
                "air_tem": 235,
                "set_tem": 50,
                "workmode": "auto",
                "working_status": "on",
                "Mon": "04:50_043C,08:00_030C"
            }),
        )
        .await;

        let mut thermostat = Thermostat::new(Device::new("thermo-1", default_client(&server)));
        thermostat.update().await.unwrap();

        assert_eq!(thermostat.temperature(), Some(23.5));
        assert_eq!(thermostat.goal_temperature(), Some(25.0));
        assert_eq!(thermostat.work_mode(), Some(weback_lib::WorkMode::Auto));
        assert!(thermostat.is_heating());
        assert_eq!(
            thermostat.auto_settings().day(chrono::Weekday::Mon),
            ["04:50_043C", "08:00_030C"]
        );
    }
}
