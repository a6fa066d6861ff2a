// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::time::Duration;

// Env values used by the oss service.
pub const OSS_ACCESS_KEY_ID: &str = "OSS_ACCESS_KEY_ID";
pub const OSS_ACCESS_KEY_SECRET: &str = "OSS_ACCESS_KEY_SECRET";
pub const OSS_SESSION_TOKEN: &str = "OSS_SESSION_TOKEN";
pub const OSS_REGION: &str = "OSS_REGION";
pub const OSS_ENDPOINT: &str = "OSS_ENDPOINT";

// Headers used in oss requests and responses.
pub const CONTENT_MD5: &str = "content-md5";
pub const OSS_HEADER_PREFIX: &str = "x-oss-";
pub const X_OSS_DATE: &str = "x-oss-date";
pub const X_OSS_CONTENT_SHA256: &str = "x-oss-content-sha256";
pub const X_OSS_SECURITY_TOKEN: &str = "x-oss-security-token";
pub const X_OSS_HASH_CRC64ECMA: &str = "x-oss-hash-crc64ecma";
pub const X_OSS_REQUEST_ID: &str = "x-oss-request-id";
pub const X_OSS_EC: &str = "x-oss-ec";
pub const X_OSS_ERR: &str = "x-oss-err";

// Query keys of V1 presigned urls.
pub const OSS_ACCESS_KEY_ID_QUERY: &str = "OSSAccessKeyId";
pub const SIGNATURE_QUERY: &str = "Signature";
pub const EXPIRES_QUERY: &str = "Expires";
pub const SECURITY_TOKEN_QUERY: &str = "security-token";

// Query keys of V4 presigned urls.
pub const X_OSS_SIGNATURE_VERSION: &str = "x-oss-signature-version";
pub const X_OSS_CREDENTIAL: &str = "x-oss-credential";
pub const X_OSS_EXPIRES: &str = "x-oss-expires";
pub const X_OSS_ADDITIONAL_HEADERS: &str = "x-oss-additional-headers";
pub const X_OSS_SIGNATURE: &str = "x-oss-signature";

// V4 signing.
pub const SIGNING_ALGORITHM_V4: &str = "OSS4-HMAC-SHA256";
pub const SIGNING_KEY_PREFIX_V4: &str = "aliyun_v4";
pub const SIGNING_TERMINATOR_V4: &str = "aliyun_v4_request";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

pub const DEFAULT_PRODUCT: &str = "oss";
pub const DEFAULT_ENDPOINT_SUFFIX: &str = "aliyuncs.com";

/// Presigned urls expire after this by default.
pub const DEFAULT_EXPIRES: Duration = Duration::from_secs(15 * 60);
/// V4 presigned urls can't live longer than 7 days.
pub const MAX_EXPIRES_V4: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(20);
pub const DEFAULT_READWRITE_TIMEOUT: Duration = Duration::from_secs(60);
