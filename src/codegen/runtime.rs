//! Self-contained C++ fragments for the networking, data-processing, and
//! time intrinsics. Everything here leans on the C++ standard library,
//! POSIX sockets, and OpenSSL only — generated programs take no third-party
//! dependencies.

use crate::parser::ast::HashAlgorithm;

/// Fixed header prelude emitted at the top of every generated program.
pub const INCLUDES: &[&str] = &[
    "#include <iostream>",
    "#include <string>",
    "#include <vector>",
    "#include <type_traits>",
    "#include <fstream>",
    "#include <sstream>",
    "#include <cstdlib>",
    "#include <tuple>",
    "#include <array>",
    "#include <memory>",
    "#include <algorithm>",
    "#include <functional>",
    "#include <regex>",
    "#include <thread>",
    "#include <future>",
    "#include <mutex>",
    "#include <chrono>",
    "#include <iomanip>",
    "#include <stdexcept>",
    "#include <ctime>",
    "#include <cmath>",
    "#include <numeric>",
    "#include <random>",
    "#include <filesystem>",
    "#include <cstring>",
    // Networking via POSIX sockets
    "#include <sys/socket.h>",
    "#include <netinet/in.h>",
    "#include <arpa/inet.h>",
    "#include <netdb.h>",
    "#include <unistd.h>",
    // OpenSSL for hashing and TLS linkage
    "#include <openssl/sha.h>",
    "#include <openssl/md5.h>",
    "#include <openssl/ssl.h>",
    "#include <openssl/err.h>",
];

pub const NOW: &str = r#"[&]() { auto now = std::chrono::system_clock::now(); auto time = std::chrono::system_clock::to_time_t(now); std::ostringstream oss; oss << std::put_time(std::localtime(&time), "%Y-%m-%d %H:%M:%S"); return oss.str(); }()"#;

pub const TODAY: &str = r#"[&]() { auto now = std::chrono::system_clock::now(); auto time = std::chrono::system_clock::to_time_t(now); std::ostringstream oss; oss << std::put_time(std::localtime(&time), "%Y-%m-%d"); return oss.str(); }()"#;

pub const CLOCK: &str = r#"[&]() { auto now = std::chrono::system_clock::now(); auto time = std::chrono::system_clock::to_time_t(now); std::ostringstream oss; oss << std::put_time(std::localtime(&time), "%H:%M:%S"); return oss.str(); }()"#;

/// Shell execution with captured stdout via popen.
pub fn run_command(command: &str) -> String {
    format!(
        r#"[&]() {{ std::string _result; std::array<char, 128> _buf; std::unique_ptr<FILE, decltype(&pclose)> _pipe(popen({command}, "r"), pclose); if (_pipe) {{ while (fgets(_buf.data(), _buf.size(), _pipe.get()) != nullptr) {{ _result += _buf.data(); }} }} return _result; }}()"#
    )
}

/// Minimal HTTP/1.1 GET over a raw socket; returns the body after the header
/// terminator.
pub fn fetch(url: &str) -> String {
    format!(
        r#"[&]() -> std::string {{
    std::string url = {url};
    // Parse URL
    std::string host, path = "/";
    size_t pos = url.find("://");
    if (pos != std::string::npos) url = url.substr(pos + 3);
    pos = url.find("/");
    if (pos != std::string::npos) {{ host = url.substr(0, pos); path = url.substr(pos); }}
    else {{ host = url; }}
    // Resolve host
    struct hostent* server = gethostbyname(host.c_str());
    if (!server) return "";
    // Create socket
    int sockfd = socket(AF_INET, SOCK_STREAM, 0);
    if (sockfd < 0) return "";
    struct sockaddr_in serv_addr;
    memset(&serv_addr, 0, sizeof(serv_addr));
    serv_addr.sin_family = AF_INET;
    serv_addr.sin_port = htons(80);
    memcpy(&serv_addr.sin_addr.s_addr, server->h_addr, server->h_length);
    if (connect(sockfd, (struct sockaddr*)&serv_addr, sizeof(serv_addr)) < 0) {{ close(sockfd); return ""; }}
    // Send HTTP request
    std::string request = "GET " + path + " HTTP/1.1\r\nHost: " + host + "\r\nConnection: close\r\n\r\n";
    send(sockfd, request.c_str(), request.length(), 0);
    // Read response
    std::string response;
    char buffer[4096];
    ssize_t n;
    while ((n = recv(sockfd, buffer, sizeof(buffer)-1, 0)) > 0) {{ buffer[n] = 0; response += buffer; }}
    close(sockfd);
    // Extract body after headers
    pos = response.find("\r\n\r\n");
    if (pos != std::string::npos) return response.substr(pos + 4);
    return response;
}}()"#
    )
}

/// Permissive key/value JSON scan: an ordered sequence of string pairs, not a
/// structured tree.
pub fn json_parse(value: &str) -> String {
    format!(
        r#"[&]() -> std::vector<std::pair<std::string, std::string>> {{
    std::vector<std::pair<std::string, std::string>> result;
    std::string json = {value};
    std::regex pattern(R"(\"([^\"]+)\"\s*:\s*(?:\"([^\"]*)\"|(\d+(?:\.\d+)?)|(\w+)))");
    std::smatch match;
    std::string::const_iterator searchStart(json.cbegin());
    while (std::regex_search(searchStart, json.cend(), match, pattern)) {{
        std::string key = match[1];
        std::string value = match[2].matched ? match[2] : (match[3].matched ? match[3] : match[4]);
        result.push_back({{key, value}});
        searchStart = match.suffix().first;
    }}
    return result;
}}()"#
    )
}

/// Naive stream insertion, not a conforming JSON encoder.
pub fn json_stringify(value: &str) -> String {
    format!(
        r#"[&]() -> std::string {{
    std::ostringstream oss;
    oss << {value};
    return oss.str();
}}()"#
    )
}

pub fn regex_find_all(pattern: &str, text: &str) -> String {
    format!(
        r#"[&]() -> std::vector<std::string> {{
    std::vector<std::string> results;
    std::string s = {text};
    std::regex r({pattern});
    std::sregex_iterator it(s.begin(), s.end(), r), end;
    for (; it != end; ++it) results.push_back((*it)[0]);
    return results;
}}()"#
    )
}

/// Hex digest via the OpenSSL one-shot functions.
pub fn hash(algorithm: HashAlgorithm, value: &str) -> String {
    let (func, len) = match algorithm {
        HashAlgorithm::Sha256 => ("SHA256", "SHA256_DIGEST_LENGTH"),
        HashAlgorithm::Sha1 => ("SHA1", "SHA_DIGEST_LENGTH"),
        HashAlgorithm::Md5 => ("MD5", "MD5_DIGEST_LENGTH"),
    };
    format!(
        r#"[&]() -> std::string {{
    std::string input = {value};
    unsigned char digest[{len}];
    {func}((unsigned char*)input.c_str(), input.length(), digest);
    std::ostringstream oss;
    for (int i = 0; i < {len}; i++) oss << std::hex << std::setfill('0') << std::setw(2) << (int)digest[i];
    return oss.str();
}}()"#
    )
}

/// Plain TCP connect for the socket intrinsics; returns the file descriptor.
pub fn socket_connect(url: &str) -> String {
    format!(
        r#"[&]() -> int {{
    std::string url = {url};
    std::string host;
    int port = 80;
    // Parse ws://host:port/path
    size_t pos = url.find("://");
    if (pos != std::string::npos) url = url.substr(pos + 3);
    pos = url.find(":");
    size_t pathPos = url.find("/");
    if (pos != std::string::npos && pos < pathPos) {{
        host = url.substr(0, pos);
        port = std::stoi(url.substr(pos + 1, pathPos - pos - 1));
    }} else {{
        host = url.substr(0, pathPos);
    }}
    struct hostent* server = gethostbyname(host.c_str());
    if (!server) return -1;
    int sockfd = socket(AF_INET, SOCK_STREAM, 0);
    if (sockfd < 0) return -1;
    struct sockaddr_in serv_addr;
    memset(&serv_addr, 0, sizeof(serv_addr));
    serv_addr.sin_family = AF_INET;
    serv_addr.sin_port = htons(port);
    memcpy(&serv_addr.sin_addr.s_addr, server->h_addr, server->h_length);
    if (connect(sockfd, (struct sockaddr*)&serv_addr, sizeof(serv_addr)) < 0) {{ close(sockfd); return -1; }}
    return sockfd;
}}()"#
    )
}
